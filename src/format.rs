//! Display helpers shared by the CLI listing views.

use crate::models::PropertyRecord;

/// `50000` -> `"KES 50,000"`
pub fn format_kes(amount: u64) -> String {
    format!("KES {}", group_thousands(amount))
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `2.0` -> `"2"`, `1.5` -> `"1.5"`
pub fn format_bathrooms(bathrooms: f32) -> String {
    if bathrooms.fract() == 0.0 {
        format!("{}", bathrooms as u32)
    } else {
        format!("{bathrooms}")
    }
}

/// One-line room summary, e.g. `"3 bd · 2 ba · 1,200 sqft"`
pub fn room_summary(record: &PropertyRecord) -> String {
    format!(
        "{} bd · {} ba · {} sqft",
        record.bedrooms,
        format_bathrooms(record.bathrooms),
        group_thousands(record.area as u64)
    )
}
