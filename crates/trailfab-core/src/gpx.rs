//! GPX track parsing.
//!
//! Streams the document with quick-xml and collects `(lon, lat)` samples:
//! every `trkpt` of every track and segment first, then every `rtept` of
//! every route, each group in document order. Segments are simply
//! concatenated; the trail is drawn as one line.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{Result, TrailfabError};

/// Parse GPX bytes into `(lon, lat)` samples.
pub fn parse_gpx(content: &[u8]) -> Result<Vec<(f64, f64)>> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut track = Vec::new();
    let mut route = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"trkpt" => track.push(read_point(e)?),
                b"rtept" => route.push(read_point(e)?),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TrailfabError::Gpx(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    track.extend(route);
    Ok(track)
}

/// Read and parse a GPX file.
///
/// ## Rust Lesson #21: The ? Operator
///
/// `fs::read(..)?` returns early with the `io::Error` converted into
/// [`TrailfabError::Io`] through its `From` impl.
pub fn parse_gpx_file<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, f64)>> {
    let content = fs::read(path.as_ref())?;
    parse_gpx(&content)
}

/// `lat`/`lon` attributes of a point element, as `(lon, lat)`.
fn read_point(e: &BytesStart) -> Result<(f64, f64)> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes().flatten() {
        let key = attr.key.local_name();
        let slot = match key.as_ref() {
            b"lat" => &mut lat,
            b"lon" => &mut lon,
            _ => continue,
        };
        let value = std::str::from_utf8(&attr.value)
            .map_err(|_| TrailfabError::Gpx("coordinate is not valid UTF-8".into()))?;
        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|_| TrailfabError::Gpx(format!("invalid coordinate '{}'", value)))?;
        if !parsed.is_finite() {
            return Err(TrailfabError::Gpx(format!("invalid coordinate '{}'", value)));
        }
        *slot = Some(parsed);
    }

    match (lon, lat) {
        (Some(lon), Some(lat)) => Ok((lon, lat)),
        _ => {
            let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
            Err(TrailfabError::Gpx(format!("<{}> without lat/lon", name)))
        }
    }
}
