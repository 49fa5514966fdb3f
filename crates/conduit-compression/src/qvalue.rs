use crate::Algorithm;

/// Parses an `Accept-Encoding` header and returns the algorithm the highest
/// acceptable q-value picks, per the `{gzip, deflate, *→gzip, identity}`
/// preference set in spec.md §4.G. Returns `None` when nothing in the
/// header is both recognized and acceptable (q > 0) -- callers treat that
/// the same as "no compressor applies".
///
/// Malformed q-values (`NaN`, `±Inf`, non-numeric, outside `[0, 1]`) drop
/// just that entry rather than the whole header. An exact `q=0` means
/// "refuse this name" and is never chosen.
pub fn negotiate(accept_encoding: &str) -> Option<Algorithm> {
    let mut best: Option<(Option<Algorithm>, f64)> = None;
    for entry in parse_entries(accept_encoding) {
        if entry.q <= 0.0 {
            continue;
        }
        let candidate = match entry.name.as_str() {
            "gzip" => Some(Some(Algorithm::Gzip)),
            "deflate" => Some(Some(Algorithm::Deflate)),
            "*" => Some(Some(Algorithm::Gzip)),
            "identity" => Some(None),
            _ => None,
        };
        let Some(candidate) = candidate else { continue };
        match best {
            Some((_, best_q)) if entry.q <= best_q => {}
            _ => best = Some((candidate, entry.q)),
        }
    }
    best.and_then(|(algorithm, _)| algorithm)
}

struct Entry {
    name: String,
    q: f64,
}

fn parse_entries(header: &str) -> Vec<Entry> {
    header
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            let mut parts = raw.split(';');
            let name = parts.next()?.trim().to_ascii_lowercase();
            let mut q = 1.0;
            for param in parts {
                let param = param.trim();
                let Some(value) = param.strip_prefix("q=").or_else(|| param.strip_prefix("Q=")) else {
                    continue;
                };
                match value.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() && (0.0..=1.0).contains(&v) => q = v,
                    // malformed q drops the entry entirely, not just the param
                    _ => return None,
                }
            }
            Some(Entry { name, q })
        })
        .collect()
}
