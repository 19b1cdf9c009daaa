use filtercheck_core::{registry, PropertyDomain, PropertyKind};

use crate::OutputFormat;

pub(crate) fn cmd_properties(output: OutputFormat) -> i32 {
    let domains: Vec<&PropertyDomain> = registry::standard().iter().collect();

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&domains)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            let width = domains.iter().map(|d| d.name.len()).max().unwrap_or(0);
            for domain in domains {
                println!(
                    "{:<width$}  {:<8}  {}",
                    domain.name,
                    domain.kind.name(),
                    describe(domain),
                    width = width
                );
            }
        }
    }
    0
}

/// Label plus whatever restricts the property's values.
fn describe(domain: &PropertyDomain) -> String {
    let mut text = domain.label.clone();
    match &domain.kind {
        PropertyKind::Enum { values } => {
            text.push_str(&format!(" [{}]", values.join(", ")));
        }
        PropertyKind::Numeric { integral, .. } => {
            match (domain.catalog_min(), domain.catalog_max()) {
                (Some(min), Some(max)) => text.push_str(&format!(" ({} to {})", min, max)),
                (Some(min), None) => text.push_str(&format!(" (>= {})", min)),
                (None, Some(max)) => text.push_str(&format!(" (<= {})", max)),
                (None, None) => {}
            }
            if *integral {
                text.push_str(" integer");
            }
        }
        PropertyKind::Boolean | PropertyKind::Text | PropertyKind::Date => {}
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_bounds_and_values() {
        let registry = registry::standard();
        let rating = registry.resolve("average_rating").unwrap();
        assert_eq!(describe(rating), "Average rating (0 to 5)");
        let stock = registry.resolve("stock_status").unwrap();
        assert_eq!(
            describe(stock),
            "Stock status [instock, outofstock, onbackorder]"
        );
    }
}
