use std::collections::HashMap;

/// Turns a raw header record into unique, non-empty column names.
///
/// Blank cells become `Unnamed: <idx>` and repeated names get a numeric
/// suffix (`Brand`, `Brand.1`, `Brand.2`) so every column survives the trip
/// into a SQL table.
pub(crate) fn normalize_header<'a, I>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (idx, cell) in cells.into_iter().enumerate() {
        let trimmed = cell.trim_start_matches('\u{feff}').trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        while let Some(count) = seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}.{count}");
        }
        seen.insert(candidate.clone(), 0);
        names.push(candidate);
    }

    names
}
