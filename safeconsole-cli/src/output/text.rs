//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Local, Utc};
use safeconsole_core::{CallClass, Session, UsageCounters};

use super::json::{ClassifyOutput, RequestOutput};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats session status.
    pub fn format_session(&self, session: &Session) -> String {
        let Some(user) = session.user.as_ref().filter(|_| session.is_authenticated()) else {
            return format!("{} Not logged in", self.dim("○"));
        };

        let mut lines = vec![format!(
            "{} {} <{}>",
            self.green("●"),
            self.bold(&user.name),
            self.cyan(&user.email)
        )];
        lines.push(format!("Role:    {}", user.role));
        if let Some(org) = &user.organization {
            lines.push(format!("Org:     {org}"));
        }
        lines.push(format!("Plan:    {}", user.subscription_tier));
        lines.push(format!("Status:  {}", user.status));
        lines.join("\n")
    }

    /// Formats quota counters with a per-module breakdown.
    pub fn format_usage(&self, counters: &UsageCounters) -> String {
        let mut lines = vec![self.bold("API Usage"), "─".repeat(40)];

        lines.push(self.format_quota(
            "Monthly",
            counters.monthly_used,
            counters.monthly_limit,
        ));
        lines.push(self.format_quota("Daily", counters.daily_used, counters.daily_limit));

        if !counters.module_usage.is_empty() {
            lines.push(String::new());
            lines.push(self.dim("By module:"));
            let mut modules: Vec<_> = counters.module_usage.iter().collect();
            modules.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (module, count) in modules {
                lines.push(format!("  {module:<16} {count}"));
            }
        }

        lines.push(String::new());
        match counters.synced_at {
            Some(at) => lines.push(self.dim(&format!("Synced {}", format_time(at)))),
            None => lines.push(self.dim("Not synced with backend; showing local defaults")),
        }

        lines.join("\n")
    }

    /// Formats one quota line: bar, remaining, and raw counts.
    fn format_quota(&self, label: &str, used: u64, limit: u64) -> String {
        let remaining = limit.saturating_sub(used);
        let percent_remaining = percent(remaining, limit);
        let bar = self.progress_bar(percent_remaining);
        let left = self.color_for_percent(percent_remaining, &format!("{remaining} left"));
        format!(
            "{:<8} {} {} {}",
            format!("{label}:"),
            bar,
            left,
            self.dim(&format!("({used}/{limit})"))
        )
    }

    /// Formats a progress bar.
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let filled = ((percent_remaining.clamp(0.0, 100.0) / 100.0) * self.bar_width as f64)
            .round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent_remaining, &bar)
    }

    /// Formats the outcome of metered requests.
    pub fn format_requests(&self, requests: &[RequestOutput]) -> String {
        requests
            .iter()
            .map(|r| {
                let outcome = match (r.status, &r.error) {
                    (Some(status), _) if (200..300).contains(&status) => {
                        self.green(&status.to_string())
                    }
                    (Some(status), _) => self.yellow(&status.to_string()),
                    (None, Some(error)) => self.red(error),
                    (None, None) => self.dim("-"),
                };
                let counted = r
                    .counted_as
                    .as_deref()
                    .map_or_else(|| self.dim("not counted"), |m| format!("+1 {m}"));
                format!("{:<6} {} {} [{}]", r.method, r.url, outcome, counted)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats classification results.
    pub fn format_classifications(&self, results: &[ClassifyOutput]) -> String {
        results
            .iter()
            .map(|r| {
                let verdict = match (&r.classification, &r.error) {
                    (Some(CallClass::Countable(module)), _) => {
                        self.green(&format!("counted: {module}"))
                    }
                    (Some(CallClass::Excluded(reason)), _) => {
                        self.yellow(&format!("excluded: {reason}"))
                    }
                    (Some(CallClass::Untracked), _) => self.dim("untracked"),
                    (None, Some(error)) => self.red(&format!("error: {error}")),
                    (None, None) => self.dim("-"),
                };
                format!("{:<6} {} → {}", r.method, r.url, verdict)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_full() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.progress_bar(100.0), "██████████");
    }

    #[test]
    fn test_progress_bar_clamps() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.progress_bar(-5.0), "░░░░░░░░░░");
        assert_eq!(formatter.progress_bar(150.0), "██████████");
    }

    #[test]
    fn test_color_for_percent() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.color_for_percent(15.0, "test").contains(RED));
        assert!(formatter.color_for_percent(35.0, "test").contains(YELLOW));
        assert!(formatter.color_for_percent(75.0, "test").contains(GREEN));
    }

    #[test]
    fn test_percent_of_zero_limit() {
        assert!(percent(0, 0).abs() < f64::EPSILON);
        assert!((percent(25, 100) - 25.0).abs() < f64::EPSILON);
    }
}
