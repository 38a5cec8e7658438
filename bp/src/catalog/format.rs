//! Prompt-ready rendering of catalog options

use super::CatalogOption;

/// Line emitted in place of the option list when the catalog is empty
pub const NO_OPTIONS_SENTINEL: &str = "// no option values provided";

/// Render options as one `Service: .., Subservice: .., Deliverable: ..` line each
pub fn format_options(options: &[CatalogOption]) -> String {
    if options.is_empty() {
        return NO_OPTIONS_SENTINEL.to_string();
    }

    options
        .iter()
        .map(|o| {
            format!(
                "Service: {}, Subservice: {}, Deliverable: {}",
                o.service, o.subservice, o.deliverables
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_yields_sentinel() {
        assert_eq!(format_options(&[]), NO_OPTIONS_SENTINEL);
    }

    #[test]
    fn test_one_line_per_option_in_order() {
        let options = vec![
            CatalogOption::new("Design", "Branding", "Logo pack"),
            CatalogOption::new("Development", "Mobile App", "iOS build"),
            CatalogOption::new("Marketing", "SEO", "Audit report"),
        ];

        let text = format_options(&options);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Service: Design, Subservice: Branding, Deliverable: Logo pack");
        assert_eq!(lines[1], "Service: Development, Subservice: Mobile App, Deliverable: iOS build");
        assert_eq!(lines[2], "Service: Marketing, Subservice: SEO, Deliverable: Audit report");
    }
}
