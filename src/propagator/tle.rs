use sgp4::Elements;

use crate::propagator::error::TleError;
use crate::propagator::sgp4_object::Sgp4Object;

/// Parse every record in a TLE text. Any malformed record rejects the whole
/// text; a partially parsed catalog is never returned.
pub fn parse_objects(content: &str, source_name: &str) -> Result<Vec<Sgp4Object>, TleError> {
    let records = parse_multi_tle(content);
    if records.is_empty() {
        return Err(TleError::NoRecords(source_name.to_string()));
    }

    let mut results = Vec::with_capacity(records.len());
    for (name, line1, line2) in records {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes()).map_err(
            |e| TleError::InvalidTle {
                source_name: source_name.to_string(),
                message: e.to_string(),
            },
        )?;
        results.push(Sgp4Object::from_elements(elements));
    }

    Ok(results)
}

/// Parse multi-satellite TLE content
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            // 2-line TLE (no name)
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && !lines[i].starts_with('#')
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3-line TLE, "0 " prefix used by some catalogs
            let name = lines[i].strip_prefix("0 ").unwrap_or(lines[i]);
            result.push((
                Some(name.to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
