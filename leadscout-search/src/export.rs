//! CSV export of leads in display order.
use leadscout_common::Lead;
use std::io;

pub const CSV_HEADER: [&str; 10] = [
    "Name",
    "Address",
    "Phone",
    "Website",
    "Rating",
    "Reviews",
    "Has Website",
    "Latitude",
    "Longitude",
    "Google Maps URL",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("csv output was not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn record(lead: &Lead) -> [String; 10] {
    [
        lead.name.clone(),
        lead.address.clone(),
        lead.phone.clone().unwrap_or_default(),
        lead.website.clone().unwrap_or_default(),
        lead.rating.map(|r| r.to_string()).unwrap_or_default(),
        lead.review_count.map(|n| n.to_string()).unwrap_or_default(),
        yes_no(lead.has_website).to_string(),
        lead.latitude.to_string(),
        lead.longitude.to_string(),
        lead.google_maps_url.clone(),
    ]
}

/// Header plus one row per lead. Empty input still yields the header.
pub fn write_csv<W: io::Write>(leads: &[Lead], out: W) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(CSV_HEADER)?;
    for lead in leads {
        w.write_record(record(lead))?;
    }
    w.flush()?;
    Ok(())
}

pub fn to_csv_string(leads: &[Lead]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(leads, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
