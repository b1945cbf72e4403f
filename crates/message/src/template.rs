//! Placeholder substitution for message templates.
//!
//! Recognized tokens: `{name}`, `{Name}`, `{NAME}`, `{phone}`, `{time}`,
//! `{date}`, `{datetime}`, `{day}`, `{month}`, `{year}`. Anything else in
//! braces is left verbatim.

use chrono::{DateTime, Local};

/// Renders a template for one contact, stamped with the current time.
pub fn render(template: &str, name: &str, phone: &str) -> String {
    render_at(template, name, phone, Local::now())
}

/// Clock-injected variant of [`render`].
pub fn render_at(template: &str, name: &str, phone: &str, now: DateTime<Local>) -> String {
    let mut out = template.to_string();

    out = out.replace("{name}", name);
    out = out.replace("{Name}", name);
    out = out.replace("{NAME}", &name.to_uppercase());
    out = out.replace("{phone}", phone);

    out = out.replace("{time}", &now.format("%H:%M").to_string());
    out = out.replace("{date}", &now.format("%B %d, %Y").to_string());
    out = out.replace("{datetime}", &now.format("%B %d, %Y at %H:%M").to_string());
    out = out.replace("{day}", &now.format("%A").to_string());
    out = out.replace("{month}", &now.format("%B").to_string());
    out = out.replace("{year}", &now.format("%Y").to_string());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 12, 30, 0).unwrap()
    }

    #[test]
    fn name_case_variants() {
        let rendered = render_at("{name} {Name} {NAME}", "ana", "123", noon());
        assert_eq!(rendered, "ana ana ANA");
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let rendered = render_at("Hi {foo}, hi {name}", "ana", "123", noon());
        assert_eq!(rendered, "Hi {foo}, hi ana");
    }

    #[test]
    fn phone_and_time_tokens() {
        let rendered = render_at("{phone} at {time} on {date}", "ana", "5215512345678", noon());
        assert_eq!(rendered, "5215512345678 at 12:30 on March 07, 2025");
    }

    #[test]
    fn day_month_year_tokens() {
        let rendered = render_at("{day} {month} {year}", "ana", "123", noon());
        assert_eq!(rendered, "Friday March 2025");
    }

    #[test]
    fn template_without_tokens_passes_through() {
        assert_eq!(render_at("plain text", "ana", "123", noon()), "plain text");
    }
}
