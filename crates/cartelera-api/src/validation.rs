//! Event publish/edit validation, enforced at the service boundary.
//! Every rule the form layer applies is re-checked here — the server
//! never trusts the client.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartelera_types::api::UpsertEventRequest;

/// Upload policy: a single image of at most 8 MB per event.
pub const MAX_MEDIA_FILES: usize = 1;
pub const MAX_MEDIA_BYTES: usize = 8 * 1024 * 1024;

/// Extension fallback for image formats browsers don't reliably report
/// by MIME type.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic"];

/// Field-keyed validation errors; empty means valid.
#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

/// Validate a publish/edit submission. `existing_media_count` is the
/// number of attachments already stored on the event being edited
/// (zero for a new event): an edit may omit media and keep what it has,
/// a new event needs at least one attachment.
pub fn validate_event(
    req: &UpsertEventRequest,
    now: DateTime<Utc>,
    existing_media_count: usize,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if req.title.trim().is_empty() {
        errors.add("title", "title is required");
    }
    if req.description.trim().is_empty() {
        errors.add("description", "description is required");
    }
    if req.province.trim().is_empty() {
        errors.add("province", "province is required");
    }
    if req.city.trim().is_empty() {
        errors.add("city", "city is required");
    }
    if req.address.trim().is_empty() {
        errors.add("address", "address is required");
    }

    // Re-checked on every submission, not just once
    if req.date <= now {
        errors.add("date", "date and time must be in the future");
    }

    if !req.is_free {
        if req.price_anticipada.is_none() {
            errors.add("price_anticipada", "required for paid events");
        }
        if req.price_general.is_none() {
            errors.add("price_general", "required for paid events");
        }
    }

    if req.multimedia.is_empty() && existing_media_count == 0 {
        errors.add("multimedia", "at least one attachment is required");
    }
    if req.multimedia.len() > MAX_MEDIA_FILES {
        errors.add("multimedia", format!("at most {MAX_MEDIA_FILES} attachment allowed"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Free events persist no price tiers, whatever stale values the price
/// inputs still held when the flag was checked.
pub fn normalize_prices(req: &UpsertEventRequest) -> (Option<f64>, Option<f64>) {
    if req.is_free {
        (None, None)
    } else {
        (req.price_anticipada, req.price_general)
    }
}

/// Upload acceptance: image MIME type, or a known image extension for
/// formats the MIME sniffing misses.
pub fn acceptable_image(content_type: Option<&str>, filename: &str) -> bool {
    if content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return true;
    }
    filename
        .rsplit('.')
        .next()
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
