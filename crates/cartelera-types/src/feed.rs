//! New-since-last-look detection for the notification feed.
//!
//! Each gateway connection keeps a gate that compares successive unread
//! counts: it fires only on a strict increase over the last observed
//! count, and only while no banner is showing. Decreases (marking read,
//! clearing) never fire it.

/// Tracks the unread count across observations and gates the transient
/// "new notification" banner.
#[derive(Debug, Default)]
pub struct BannerGate {
    last_count: usize,
    banner_active: bool,
}

impl BannerGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly computed unread count. Returns true when the
    /// banner (and its one alert sound) should fire.
    pub fn observe(&mut self, unread_count: usize) -> bool {
        let increased = unread_count > self.last_count;
        self.last_count = unread_count;

        if increased && !self.banner_active {
            self.banner_active = true;
            return true;
        }
        false
    }

    /// The banner was dismissed (auto-timeout or user swipe); the next
    /// increase may fire again.
    pub fn dismiss(&mut self) {
        self.banner_active = false;
    }

    pub fn banner_active(&self) -> bool {
        self.banner_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_strict_increase_only() {
        let mut gate = BannerGate::new();
        let counts = [0, 2, 2, 5, 5, 3];
        let mut fired = Vec::new();
        for count in counts {
            let f = gate.observe(count);
            if f {
                gate.dismiss(); // banner expires before the next observation
            }
            fired.push(f);
        }
        assert_eq!(fired, [false, true, false, true, false, false]);
    }

    #[test]
    fn active_banner_suppresses_refire() {
        let mut gate = BannerGate::new();
        assert!(gate.observe(1));
        // Banner still showing: further increases stay quiet
        assert!(!gate.observe(3));
        assert!(!gate.observe(7));
        assert!(gate.banner_active());

        gate.dismiss();
        assert!(gate.observe(8));
    }

    #[test]
    fn decrease_then_recovery_to_old_peak_does_not_fire_above_stale_state() {
        let mut gate = BannerGate::new();
        assert!(gate.observe(5));
        gate.dismiss();
        // Clearing read items drops the count
        assert!(!gate.observe(1));
        // A genuinely new notification fires again
        assert!(gate.observe(2));
    }
}
