//! Reader for the product XML written by ISCE preprocessing.
//!
//! Products are trees of `<component name="...">` elements holding
//! `<property name="..."><value>...</value></property>` entries. Property and
//! component names are compared after lowercasing and dropping spaces and
//! underscores, so `number of lines`, `NUMBER_OF_LINES` and `numberoflines`
//! are the same key.

use crate::types::{
    Frame, OrbitData, PassDirection, PointingDirection, SarError, SarResult, StateVector, Swath,
    Track,
};
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};

/// Node of a product XML tree
#[derive(Debug, Clone, Default)]
pub struct Component {
    pub name: String,
    pub properties: Vec<(String, String)>,
    pub children: Vec<Component>,
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl Component {
    /// Raw value of a property
    pub fn property(&self, name: &str) -> Option<&str> {
        let key = normalize_key(name);
        self.properties
            .iter()
            .find(|(k, _)| normalize_key(k) == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Direct child component by name
    pub fn child(&self, name: &str) -> Option<&Component> {
        let key = normalize_key(name);
        self.children.iter().find(|c| normalize_key(&c.name) == key)
    }

    /// All descendants (depth first, document order) satisfying `pred`
    pub fn find_all<'a, F>(&'a self, pred: &F) -> Vec<&'a Component>
    where
        F: Fn(&Component) -> bool,
    {
        let mut found = Vec::new();
        for child in &self.children {
            if pred(child) {
                found.push(child);
            }
            found.extend(child.find_all(pred));
        }
        found
    }

    pub fn required(&self, name: &str) -> SarResult<&str> {
        self.property(name).ok_or_else(|| {
            SarError::XmlParsing(format!("Component '{}' has no property '{}'", self.name, name))
        })
    }

    pub fn required_f64(&self, name: &str) -> SarResult<f64> {
        let raw = self.required(name)?;
        raw.trim().parse::<f64>().map_err(|e| {
            SarError::XmlParsing(format!("Property '{}' is not a number ({}): {}", name, raw, e))
        })
    }

    pub fn required_usize(&self, name: &str) -> SarResult<usize> {
        // Integer counts are sometimes written as floats
        let value = self.required_f64(name)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(SarError::XmlParsing(format!(
                "Property '{}' is not a count: {}",
                name, value
            )));
        }
        Ok(value as usize)
    }

    pub fn required_time(&self, name: &str) -> SarResult<NaiveDateTime> {
        parse_time(self.required(name)?)
    }

    pub fn required_vector(&self, name: &str) -> SarResult<[f64; 3]> {
        parse_vector(self.required(name)?)
    }
}

/// Parse product XML text into its root component
pub fn parse_product(xml: &str) -> SarResult<Component> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Component> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut property: Option<(String, Option<String>)> = None;
    let mut root: Option<Component> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let name_attr = name_attribute(&e)?;

                if stack.is_empty() {
                    stack.push(Component { name: tag.clone(), ..Default::default() });
                } else if tag == "component" {
                    stack.push(Component {
                        name: name_attr.unwrap_or_default(),
                        ..Default::default()
                    });
                } else if tag == "property" {
                    property = Some((name_attr.unwrap_or_default(), None));
                }
                tags.push(tag);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SarError::XmlParsing(format!("Bad text node: {}", e)))?;
                if let (Some((_, value)), Some(tag)) = (property.as_mut(), tags.last()) {
                    // <value> wins over bare text directly inside <property>
                    if tag == "value" || (tag == "property" && value.is_none()) {
                        *value = Some(text.trim().to_string());
                    }
                }
            }
            Ok(Event::End(_)) => {
                let tag = tags.pop().unwrap_or_default();
                if tag == "property" {
                    if let (Some((name, value)), Some(top)) = (property.take(), stack.last_mut()) {
                        top.properties.push((name, value.unwrap_or_default()));
                    }
                } else if tag == "component" || tags.is_empty() {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => root = Some(done),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SarError::XmlParsing(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    root.ok_or_else(|| SarError::XmlParsing("Product XML has no root element".to_string()))
}

fn name_attribute(e: &quick_xml::events::BytesStart) -> SarResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| SarError::XmlParsing(format!("Bad attribute: {}", e)))?;
        if attr.key.as_ref() == b"name" {
            let value = attr
                .unescape_value()
                .map_err(|e| SarError::XmlParsing(format!("Bad attribute value: {}", e)))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

/// Parse a product time stamp (`2018-08-08 05:19:27.123456`, `T` separator accepted)
pub fn parse_time(raw: &str) -> SarResult<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(t);
        }
    }
    Err(SarError::XmlParsing(format!("Unrecognised time: {}", raw)))
}

/// Parse a `[x, y, z]` vector
pub fn parse_vector(raw: &str) -> SarResult<[f64; 3]> {
    let values = raw
        .trim()
        .trim_start_matches(|c| c == '[' || c == '(')
        .trim_end_matches(|c| c == ']' || c == ')')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SarError::XmlParsing(format!("Bad vector {}: {}", raw, e)))?;

    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(SarError::XmlParsing(format!(
            "Expected 3 components, found {}: {}",
            values.len(),
            raw
        ))),
    }
}

fn read_product(path: &Path) -> SarResult<Component> {
    log::debug!("Loading product {}", path.display());
    let xml = fs::read_to_string(path)?;
    parse_product(&xml)
}

fn orbit_from_component(orbit: &Component) -> SarResult<OrbitData> {
    let is_state_vector = |c: &Component| {
        c.has_property("time") && c.has_property("position") && c.has_property("velocity")
    };

    let mut state_vectors = orbit
        .find_all(&is_state_vector)
        .into_iter()
        .map(|c| {
            Ok(StateVector {
                time: c.required_time("time")?,
                position: c.required_vector("position")?,
                velocity: c.required_vector("velocity")?,
            })
        })
        .collect::<SarResult<Vec<_>>>()?;
    state_vectors.sort_by_key(|sv| sv.time);
    if let Some(pair) = state_vectors.windows(2).find(|pair| pair[0].time == pair[1].time) {
        return Err(SarError::XmlParsing(format!(
            "Duplicate state vector time {}",
            pair[0].time
        )));
    }

    Ok(OrbitData {
        state_vectors,
        quality: orbit.property("orbitquality").unwrap_or_default().to_string(),
        source: orbit.property("orbitsource").unwrap_or_default().to_string(),
    })
}

fn swath_from_component(c: &Component) -> SarResult<Swath> {
    Ok(Swath {
        sensing_start: c.required_time("sensingstart")?,
        number_of_lines: c.required_usize("numberoflines")?,
        number_of_samples: c.required_usize("numberofsamples")?,
        starting_range: c.required_f64("startingrange")?,
        range_pixel_size: c.required_f64("rangepixelsize")?,
        azimuth_line_interval: c.required_f64("azimuthlineinterval")?,
        azimuth_pixel_size: c.required_f64("azimuthpixelsize")?,
    })
}

/// Build a frame from a parsed `<date>.frame.xml`
pub fn frame_from_product(product: &Component) -> SarResult<Frame> {
    let swaths = product
        .find_all(&|c: &Component| c.has_property("sensingstart"))
        .into_iter()
        .map(swath_from_component)
        .collect::<SarResult<Vec<_>>>()?;
    Ok(Frame { swaths })
}

/// Build a track from a parsed `<date>.track.xml` and its frames. Name fields
/// are left empty for the caller to stamp.
pub fn track_from_product(product: &Component, frames: Vec<Frame>) -> SarResult<Track> {
    let orbit = product
        .child("orbit")
        .ok_or_else(|| SarError::XmlParsing("Track has no orbit component".to_string()))?;

    Ok(Track {
        pass_direction: PassDirection::from_str(product.required("passdirection")?)?,
        pointing_direction: PointingDirection::from_str(product.required("pointingdirection")?)?,
        radar_wavelength: product.required_f64("radarwavelength")?,
        orbit: orbit_from_component(orbit)?,
        frames,
        spacecraft_name: String::new(),
        orbit_number: String::new(),
        frame_number: String::new(),
    })
}

/// Frame parameter files `f*_*/<date>.frame.xml` under `work_dir`, sorted
pub fn frame_files(work_dir: &Path, date: &str) -> SarResult<Vec<PathBuf>> {
    let pattern = work_dir.join("f*_*").join(format!("{}.frame.xml", date));
    let pattern = pattern.to_string_lossy();
    let mut files = glob::glob(&pattern)
        .map_err(|e| SarError::Processing(format!("Bad glob pattern {}: {}", pattern, e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SarError::Io(e.into_error()))?;
    files.sort();
    Ok(files)
}

/// Load `<date>.track.xml` and its frames from a preprocessing directory
pub fn load_track<P: AsRef<Path>>(work_dir: P, date: &str) -> SarResult<Track> {
    let work_dir = work_dir.as_ref();
    let track_product = read_product(&work_dir.join(format!("{}.track.xml", date)))?;

    let frames = frame_files(work_dir, date)?
        .iter()
        .map(|path| read_product(path).and_then(|p| frame_from_product(&p)))
        .collect::<SarResult<Vec<_>>>()?;

    log::info!("Loaded track {} with {} frame(s)", date, frames.len());
    track_from_product(&track_product, frames)
}
