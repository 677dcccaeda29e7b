//! Line-based address-event log.
//!
//! Each line is one bottle of events:
//!
//! ```text
//! <bottle> <ts> AE (<ticks0> <addr0> <ticks1> <addr1> ...)
//! ```
//!
//! `ticks` is the event timestamp in 80 ns clock ticks, stored as a 32-bit
//! counter that wraps roughly every 343 s; the reader unwraps it back to a
//! monotonic timeline. `addr` packs polarity, x and y as
//! `(y << 12) | (x << 1) | pol` (10 bits of x, 9 bits of y). The bottle
//! timestamp is the first event's timestamp in seconds.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::event::{Event, EventStream};

/// Sensor clock period: one timestamp tick is 80 ns.
pub const CLOCK_PERIOD_S: f64 = 80e-9;

/// Default number of events per output bottle.
pub const DEFAULT_BOTTLE_SIZE: usize = 1000;

const X_BITS: u32 = 10;
const Y_BITS: u32 = 9;

pub fn encode_address(x: u16, y: u16, polarity: bool) -> u32 {
    (y as u32) << (X_BITS + 2) | (x as u32) << 1 | polarity as u32
}

pub fn decode_address(addr: u32) -> (u16, u16, bool) {
    let pol = addr & 1 != 0;
    let x = (addr >> 1) & ((1 << X_BITS) - 1);
    let y = (addr >> (X_BITS + 2)) & ((1 << Y_BITS) - 1);
    (x as u16, y as u16, pol)
}

/// Unwraps the 32-bit tick counter into a monotonic 64-bit timeline.
#[derive(Default)]
struct TickClock {
    wraps: u64,
    last_raw: u32,
}

impl TickClock {
    fn unwrap(&mut self, raw: u32) -> u64 {
        if raw < self.last_raw {
            self.wraps += 1;
        }
        self.last_raw = raw;
        (self.wraps << 32) | raw as u64
    }
}

/// Read `data.log` inside an event directory into an `EventStream`.
///
/// Any line that fails to parse is a `MalformedRecord`.
pub fn read_event_log(dir: &Path) -> Result<EventStream> {
    let path = dir.join("data.log");
    if !path.is_file() {
        return Err(Error::MissingInput(path));
    }
    let reader = BufReader::new(File::open(&path)?);

    let mut stream = EventStream::new();
    let mut clock = TickClock::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        parse_bottle(&line, line_no, &mut clock, &mut stream)?;
    }
    Ok(stream)
}

fn parse_bottle(
    line: &str,
    line_no: usize,
    clock: &mut TickClock,
    stream: &mut EventStream,
) -> Result<()> {
    let mut tokens = line.split_whitespace();
    let _bottle: u64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| Error::malformed(line_no, "missing or non-integer bottle index"))?;
    let _ts: f64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| Error::malformed(line_no, "missing or non-numeric bottle timestamp"))?;
    match tokens.next() {
        Some("AE") => {}
        other => {
            return Err(Error::malformed(
                line_no,
                format!("expected AE tag, got {:?}", other),
            ))
        }
    }

    let rest = line
        .splitn(2, "AE")
        .nth(1)
        .map(str::trim)
        .unwrap_or_default();
    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| Error::malformed(line_no, "event list not parenthesized"))?;

    let mut values = body.split_whitespace();
    loop {
        let ticks = match values.next() {
            None => break,
            Some(t) => t
                .parse::<u32>()
                .map_err(|_| Error::malformed(line_no, format!("non-integer tick count {:?}", t)))?,
        };
        let addr = values
            .next()
            .ok_or_else(|| Error::malformed(line_no, "dangling tick count without address"))?
            .parse::<u32>()
            .map_err(|_| Error::malformed(line_no, "non-integer address"))?;

        let (x, y, pol) = decode_address(addr);
        let full_ticks = clock.unwrap(ticks);
        stream.push(Event::new(x, y, pol, full_ticks as f64 * CLOCK_PERIOD_S));
    }
    Ok(())
}

/// Write an `EventStream` as `data.log` inside `dir`, bottling events in
/// groups of at most `bottle_size`.
pub fn write_event_log(dir: &Path, stream: &EventStream, bottle_size: usize) -> Result<()> {
    if bottle_size == 0 {
        return Err(Error::invalid_parameter("bottle size must be positive"));
    }
    std::fs::create_dir_all(dir)?;
    let mut out = BufWriter::new(File::create(dir.join("data.log"))?);

    let mut bottle = 0u64;
    let mut i = 0;
    while i < stream.len() {
        let end = (i + bottle_size).min(stream.len());
        write!(out, "{} {:.9} AE (", bottle, stream.ts[i])?;
        for j in i..end {
            if j > i {
                write!(out, " ")?;
            }
            let ticks = (stream.ts[j] / CLOCK_PERIOD_S).round() as u64 & u32::MAX as u64;
            write!(
                out,
                "{} {}",
                ticks,
                encode_address(stream.x[j], stream.y[j], stream.pol[j])
            )?;
        }
        writeln!(out, ")")?;
        bottle += 1;
        i = end;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip() {
        for &(x, y, pol) in &[(0u16, 0u16, false), (345, 260, true), (1023, 511, true)] {
            assert_eq!(decode_address(encode_address(x, y, pol)), (x, y, pol));
        }
    }

    #[test]
    fn test_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut stream = EventStream::new();
        for i in 0..2500u32 {
            stream.push(Event::new(
                (i % 640) as u16,
                (i % 480) as u16,
                i % 2 == 0,
                i as f64 * 1e-4,
            ));
        }
        write_event_log(dir.path(), &stream, DEFAULT_BOTTLE_SIZE).unwrap();
        let back = read_event_log(dir.path()).unwrap();

        assert_eq!(back.len(), stream.len());
        assert_eq!(back.x, stream.x);
        assert_eq!(back.y, stream.y);
        assert_eq!(back.pol, stream.pol);
        for (a, b) in back.ts.iter().zip(stream.ts.iter()) {
            assert!((a - b).abs() < CLOCK_PERIOD_S, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_bottling() {
        let dir = tempfile::tempdir().unwrap();
        let stream: EventStream = (0..25)
            .map(|i| Event::new(i as u16, 0, true, i as f64 * 1e-3))
            .collect();
        write_event_log(dir.path(), &stream, 10).unwrap();

        let text = std::fs::read_to_string(dir.path().join("data.log")).unwrap();
        assert_eq!(text.lines().count(), 3); // 10 + 10 + 5
        assert!(text.lines().nth(2).unwrap().starts_with("2 "));
    }

    #[test]
    fn test_tick_wraparound_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        // 32-bit ticks at 80 ns wrap at ~343.6 s; span the boundary
        let ts = vec![343.0, 343.5, 344.0, 400.0];
        let stream: EventStream = ts
            .iter()
            .map(|&t| Event::new(1, 1, true, t))
            .collect();
        write_event_log(dir.path(), &stream, DEFAULT_BOTTLE_SIZE).unwrap();

        let back = read_event_log(dir.path()).unwrap();
        for (a, b) in back.ts.iter().zip(ts.iter()) {
            assert!((a - b).abs() < 1e-6, "{} vs {}", a, b);
        }
        assert!(back.ts.windows(2).all(|w| w[0] < w[1]), "timeline must stay monotonic");
    }

    #[test]
    fn test_zero_bottle_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_event_log(dir.path(), &EventStream::new(), 0).is_err());
    }

    #[test]
    fn test_missing_log_dir() {
        let err = read_event_log(Path::new("/nonexistent/ch0dvs")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_malformed_bottle_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.log"), "0 0.0 AE (123)\n").unwrap();
        let err = read_event_log(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 1, .. }));
    }

    #[test]
    fn test_wrong_tag_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.log"), "0 0.0 SKLT (1 2)\n").unwrap();
        assert!(read_event_log(dir.path()).is_err());
    }
}
