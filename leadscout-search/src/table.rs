use leadscout_common::Lead;
use std::fmt::Write;

const COLUMNS: [(&str, usize); 6] = [
    ("NAME", 32),
    ("RATING", 6),
    ("REVIEWS", 7),
    ("WEBSITE", 7),
    ("PHONE", 18),
    ("ADDRESS", 48),
];

/// Shorten to `width` chars, marking the cut with `…`.
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn push_row(out: &mut String, cells: [String; 6]) {
    let line = cells
        .iter()
        .zip(COLUMNS)
        .map(|(cell, (_, width))| format!("{:<width$}", fit(cell, width)))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Fixed-width table for terminal output.
pub fn render_table(leads: &[Lead]) -> String {
    let mut out = String::new();
    push_row(&mut out, COLUMNS.map(|(title, _)| title.to_string()));
    for lead in leads {
        push_row(
            &mut out,
            [
                lead.name.clone(),
                lead.rating.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".into()),
                lead.review_count
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".into()),
                if lead.has_website { "yes" } else { "no" }.to_string(),
                lead.phone.clone().unwrap_or_else(|| "-".into()),
                lead.address.clone(),
            ],
        );
    }
    let _ = writeln!(out, "{} lead(s)", leads.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_common::LeadFields;

    #[test]
    fn truncates_long_cells() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn renders_header_rows_and_count() {
        let lead = Lead::new(LeadFields {
            name: "The Very Long Named Neighbourhood Bakery & Cafe".into(),
            rating: Some(4.25),
            website: Some("https://bakery.example".into()),
            ..Default::default()
        });
        let out = render_table(&[lead]);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("The Very Long Named Neighbourho…"));
        assert!(lines[1].contains("4.2") || lines[1].contains("4.3"));
        assert!(lines[1].contains("yes"));
        assert_eq!(lines[2], "1 lead(s)");
    }
}
