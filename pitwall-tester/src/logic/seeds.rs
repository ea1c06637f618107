use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Seed used when no tokens are supplied.
pub const DEFAULT_SEED: u64 = 1337;

/// Largest range a single `a..b` token may expand to.
const MAX_RANGE_LEN: u64 = 100_000;

static RANGE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<start>\d+)\.\.(?P<inclusive>=)?(?P<end>\d+)$").expect("valid range regex")
});

/// Resolve CLI seed tokens into a deduplicated, order-preserving seed list.
///
/// Accepts decimal integers (negative values fold to their magnitude),
/// `0x`-prefixed hex, and `a..b` / `a..=b` ranges.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let value = u64::from_str_radix(hex, 16)
                .with_context(|| format!("invalid hex seed: {token}"))?;
            pending.push(value);
            continue;
        }

        if let Some(caps) = RANGE_TOKEN.captures(token) {
            pending.extend(expand_range(
                &caps["start"],
                &caps["end"],
                caps.name("inclusive").is_some(),
            )?);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(DEFAULT_SEED);
    }

    Ok(pending)
}

fn expand_range(start: &str, end: &str, inclusive: bool) -> Result<Vec<u64>> {
    let start: u64 = start
        .parse()
        .with_context(|| format!("range start out of bounds: {start}"))?;
    let end: u64 = end
        .parse()
        .with_context(|| format!("range end out of bounds: {end}"))?;
    let end = if inclusive {
        end.checked_add(1).context("inclusive range end overflows")?
    } else {
        end
    };
    if end <= start {
        bail!("Empty seed range: {start}..{end}");
    }
    if end - start > MAX_RANGE_LEN {
        bail!("Seed range {start}..{end} exceeds {MAX_RANGE_LEN} seeds");
    }
    Ok((start..end).collect())
}
