use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::skeleton::{h36m_to_target, Joint, SkeletonSample};

/// Reader for the fixed-rate skeleton ground-truth log.
///
/// One sample per line:
///
/// ```text
/// <bottle> <ts> SKLT (<x0> <y0> <x1> <y1> ...)
/// ```
///
/// Coordinates are integer pixel positions in the H36M joint layout; each
/// line is remapped to the 13-joint target layout on the way in. Parsing is
/// strict: any line that does not match the shape above fails with
/// `MalformedRecord`. Silently dropping a sample would desynchronize the
/// event/label alignment downstream, so there is no skip-and-continue here.
pub fn read_skeleton_log(path: &Path) -> Result<Vec<SkeletonSample>> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);

    let mut samples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(parse_line(&line, line_no)?);
    }
    Ok(samples)
}

fn parse_line(line: &str, line_no: usize) -> Result<SkeletonSample> {
    let mut tokens = line.split_whitespace();

    let _bottle: u64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| Error::malformed(line_no, "missing or non-integer bottle index"))?;
    let timestamp: f64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| Error::malformed(line_no, "missing or non-numeric timestamp"))?;
    match tokens.next() {
        Some("SKLT") => {}
        other => {
            return Err(Error::malformed(
                line_no,
                format!("expected SKLT tag, got {:?}", other),
            ))
        }
    }

    // Remainder is a parenthesized flat list of integer coordinates
    let rest = line
        .splitn(2, "SKLT")
        .nth(1)
        .map(str::trim)
        .unwrap_or_default();
    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| Error::malformed(line_no, "coordinates not parenthesized"))?;

    let mut coords = Vec::new();
    for token in body.split_whitespace() {
        let v: i64 = token
            .parse()
            .map_err(|_| Error::malformed(line_no, format!("non-integer coordinate {:?}", token)))?;
        coords.push(v as f64);
    }
    if coords.is_empty() || coords.len() % 2 != 0 {
        return Err(Error::malformed(
            line_no,
            format!("expected an even number of coordinates, got {}", coords.len()),
        ));
    }

    let source: Vec<Joint> = coords
        .chunks_exact(2)
        .map(|c| Joint { x: c[0], y: c[1] })
        .collect();
    let joints = h36m_to_target(&source)
        .map_err(|e| Error::malformed(line_no, e.to_string()))?;

    Ok(SkeletonSample { joints, timestamp })
}
