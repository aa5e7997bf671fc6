use std::io::{Read, Write};

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::context::Scene;
use crate::error::PersistError;
use crate::scale::Point;
use crate::world::Serial;

/// Markup `type` attribute of container windows.
pub const CONTAINER_KIND: &str = "container";

const GUMP_ELEMENT: &[u8] = b"gump";

/// Historical layout of saved container windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    V1,
    V2,
    V3,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V3;

    pub fn number(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = PersistError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(PersistError::UnsupportedVersion(other)),
        }
    }
}

/// A container window's binary record, one variant per schema version.
///
/// Each variant is the literal field sequence of its version (little-endian):
///
/// | version | fields |
/// |---------|--------|
/// | 1 | serial `u32`, graphic `u16` |
/// | 2 | placeholder `u32`, minimized `u8`, serial `u32`, graphic `u16` |
/// | 3 | serial `u32`, graphic `u16`, minimized `u8` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryRecord {
    V1 {
        serial: Serial,
        graphic: u16,
    },
    V2 {
        placeholder: u32,
        minimized: bool,
        serial: Serial,
        graphic: u16,
    },
    V3 {
        serial: Serial,
        graphic: u16,
        minimized: bool,
    },
}

impl BinaryRecord {
    /// Record of the given widget state in `version`'s layout.
    pub fn capture(version: SchemaVersion, serial: Serial, graphic: u16, minimized: bool) -> Self {
        match version {
            SchemaVersion::V1 => Self::V1 { serial, graphic },
            SchemaVersion::V2 => Self::V2 {
                placeholder: 0,
                minimized,
                serial,
                graphic,
            },
            SchemaVersion::V3 => Self::V3 {
                serial,
                graphic,
                minimized,
            },
        }
    }

    pub fn version(&self) -> SchemaVersion {
        match self {
            Self::V1 { .. } => SchemaVersion::V1,
            Self::V2 { .. } => SchemaVersion::V2,
            Self::V3 { .. } => SchemaVersion::V3,
        }
    }

    pub fn serial(&self) -> Serial {
        match *self {
            Self::V1 { serial, .. } | Self::V2 { serial, .. } | Self::V3 { serial, .. } => serial,
        }
    }

    pub fn graphic(&self) -> u16 {
        match *self {
            Self::V1 { graphic, .. } | Self::V2 { graphic, .. } | Self::V3 { graphic, .. } => {
                graphic
            }
        }
    }

    /// The minimize flag stored in the record, if its version has one.
    pub fn minimized(&self) -> Option<bool> {
        match *self {
            Self::V1 { .. } => None,
            Self::V2 { minimized, .. } | Self::V3 { minimized, .. } => Some(minimized),
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), PersistError> {
        match *self {
            Self::V1 { serial, graphic } => {
                writer.write_all(&serial.to_le_bytes())?;
                writer.write_all(&graphic.to_le_bytes())?;
            }
            Self::V2 {
                placeholder,
                minimized,
                serial,
                graphic,
            } => {
                writer.write_all(&placeholder.to_le_bytes())?;
                writer.write_all(&[minimized as u8])?;
                writer.write_all(&serial.to_le_bytes())?;
                writer.write_all(&graphic.to_le_bytes())?;
            }
            Self::V3 {
                serial,
                graphic,
                minimized,
            } => {
                writer.write_all(&serial.to_le_bytes())?;
                writer.write_all(&graphic.to_le_bytes())?;
                writer.write_all(&[minimized as u8])?;
            }
        }
        Ok(())
    }

    pub fn read<R: Read>(version: SchemaVersion, reader: &mut R) -> Result<Self, PersistError> {
        let record = match version {
            SchemaVersion::V1 => Self::V1 {
                serial: read_u32(reader)?,
                graphic: read_u16(reader)?,
            },
            SchemaVersion::V2 => Self::V2 {
                placeholder: read_u32(reader)?,
                minimized: read_bool(reader)?,
                serial: read_u32(reader)?,
                graphic: read_u16(reader)?,
            },
            SchemaVersion::V3 => Self::V3 {
                serial: read_u32(reader)?,
                graphic: read_u16(reader)?,
                minimized: read_bool(reader)?,
            },
        };
        Ok(record)
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(PersistError::from_read)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16, PersistError> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf).map_err(PersistError::from_read)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_bool<R: Read>(reader: &mut R) -> Result<bool, PersistError> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).map_err(PersistError::from_read)?;
    Ok(buf[0] != 0)
}

/// A window saved as a markup element.
///
/// `type`, `x`, `y` and `serial` belong to the window; `graphic` and
/// `isminimized` to the container. Restoring reads only the window part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupRecord {
    pub kind: String,
    pub location: Point,
    pub serial: Serial,
    pub graphic: Option<u16>,
    pub minimized: Option<bool>,
}

impl MarkupRecord {
    pub fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), PersistError> {
        let x = self.location.x.to_string();
        let y = self.location.y.to_string();
        let serial = self.serial.to_string();

        let mut element = BytesStart::new("gump");
        element.push_attribute(("type", self.kind.as_str()));
        element.push_attribute(("x", x.as_str()));
        element.push_attribute(("y", y.as_str()));
        element.push_attribute(("serial", serial.as_str()));

        if let Some(graphic) = self.graphic {
            let graphic = graphic.to_string();
            element.push_attribute(("graphic", graphic.as_str()));
        }
        if let Some(minimized) = self.minimized {
            element.push_attribute(("isminimized", format_bool(minimized)));
        }

        writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    pub fn from_element(element: &BytesStart) -> Result<Self, PersistError> {
        let mut kind = None;
        let mut x = None;
        let mut y = None;
        let mut serial = None;
        let mut graphic = None;
        let mut minimized = None;

        for attr in element.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"type" => kind = Some(value.into_owned()),
                b"x" => x = Some(parse_number::<i32>("x", &value)?),
                b"y" => y = Some(parse_number::<i32>("y", &value)?),
                b"serial" => serial = Some(parse_number::<u32>("serial", &value)?),
                // container attributes are informational; bad values are dropped
                b"graphic" => graphic = parse_number::<u16>("graphic", &value).ok(),
                b"isminimized" => minimized = parse_bool("isminimized", &value).ok(),
                _ => {}
            }
        }

        Ok(Self {
            kind: kind.ok_or(PersistError::MissingAttribute("type"))?,
            location: Point::new(
                x.ok_or(PersistError::MissingAttribute("x"))?,
                y.ok_or(PersistError::MissingAttribute("y"))?,
            ),
            serial: serial.ok_or(PersistError::MissingAttribute("serial"))?,
            graphic,
            minimized,
        })
    }
}

/// Parse every `<gump>` element in a markup document.
pub fn parse_markup(xml: &str) -> Result<Vec<MarkupRecord>, PersistError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == GUMP_ELEMENT => {
                records.push(MarkupRecord::from_element(e)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Parse a single `<gump>` element.
pub fn parse_markup_element(xml: &str) -> Result<MarkupRecord, PersistError> {
    parse_markup(xml)?
        .into_iter()
        .next()
        .ok_or(PersistError::NoElement)
}

/// Restore a container window from its binary record.
///
/// Nothing is rebuilt from the record: the container is scheduled to be
/// opened again through the normal open path, and the restored window ends
/// there. Returns the serial that was scheduled.
pub fn restore_binary<R: Read>(
    version: SchemaVersion,
    reader: &mut R,
    scene: &mut dyn Scene,
) -> Result<Serial, PersistError> {
    let record = BinaryRecord::read(version, reader)?;
    let serial = record.serial();

    debug!(
        "Restoring container {:#010X} (schema v{}), scheduling reopen",
        serial,
        version.number()
    );
    scene.double_click_delayed(serial);

    Ok(serial)
}

/// Restore a container window from its markup record.
///
/// `graphic` and `isminimized` are ignored; only the serial is used to
/// schedule the reopen.
pub fn restore_markup(record: &MarkupRecord, scene: &mut dyn Scene) -> Serial {
    debug!("Restoring container {:#010X} from markup, scheduling reopen", record.serial);
    scene.double_click_delayed(record.serial);
    record.serial
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, PersistError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(PersistError::InvalidAttribute {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, PersistError> {
    value.trim().parse().map_err(|_| PersistError::InvalidAttribute {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeferredOpens;
    use std::io::Cursor;

    fn bytes(record: BinaryRecord) -> Vec<u8> {
        let mut out = Vec::new();
        record.write(&mut out).unwrap();
        out
    }

    #[test]
    fn test_version_numbers() {
        assert_eq!(SchemaVersion::try_from(2).unwrap(), SchemaVersion::V2);
        assert!(matches!(
            SchemaVersion::try_from(4),
            Err(PersistError::UnsupportedVersion(4))
        ));
        assert!(matches!(
            SchemaVersion::try_from(0),
            Err(PersistError::UnsupportedVersion(0))
        ));
        assert_eq!(SchemaVersion::CURRENT.number(), 3);
    }

    #[test]
    fn test_literal_layouts() {
        let serial = 0x4000_0102;
        let graphic = 0x003C;

        assert_eq!(
            bytes(BinaryRecord::capture(SchemaVersion::V1, serial, graphic, true)),
            vec![0x02, 0x01, 0x00, 0x40, 0x3C, 0x00]
        );
        assert_eq!(
            bytes(BinaryRecord::capture(SchemaVersion::V2, serial, graphic, true)),
            vec![0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x01, 0x00, 0x40, 0x3C, 0x00]
        );
        assert_eq!(
            bytes(BinaryRecord::capture(SchemaVersion::V3, serial, graphic, true)),
            vec![0x02, 0x01, 0x00, 0x40, 0x3C, 0x00, 0x01]
        );
    }

    #[test]
    fn test_v2_reads_leading_fields() {
        let data = [0xAA, 0xBB, 0xCC, 0xDD, 0x01, 0x10, 0x00, 0x00, 0x40, 0x09, 0x00];
        let record = BinaryRecord::read(SchemaVersion::V2, &mut Cursor::new(&data[..])).unwrap();
        assert_eq!(
            record,
            BinaryRecord::V2 {
                placeholder: 0xDDCC_BBAA,
                minimized: true,
                serial: 0x4000_0010,
                graphic: 0x0009,
            }
        );
    }

    #[test]
    fn test_same_bytes_differ_by_version() {
        let data = bytes(BinaryRecord::capture(SchemaVersion::V3, 7, 0x003C, true));

        let v3 = BinaryRecord::read(SchemaVersion::V3, &mut Cursor::new(&data)).unwrap();
        assert_eq!(v3.serial(), 7);
        assert_eq!(v3.minimized(), Some(true));

        // v1 stops before the trailing flag
        let mut cursor = Cursor::new(&data);
        let v1 = BinaryRecord::read(SchemaVersion::V1, &mut cursor).unwrap();
        assert_eq!(v1.serial(), 7);
        assert_eq!(v1.minimized(), None);
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_truncated_record() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x3C];
        let err = BinaryRecord::read(SchemaVersion::V3, &mut Cursor::new(&data[..])).unwrap_err();
        assert!(matches!(err, PersistError::Truncated));
    }

    #[test]
    fn test_restore_binary_schedules_reopen() {
        let data = bytes(BinaryRecord::capture(SchemaVersion::V3, 0x4000_0001, 0x003C, true));
        let mut scene = DeferredOpens::default();

        let serial =
            restore_binary(SchemaVersion::V3, &mut Cursor::new(&data), &mut scene).unwrap();

        assert_eq!(serial, 0x4000_0001);
        assert_eq!(scene.pop(), Some(0x4000_0001));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_markup_write_and_parse() {
        let record = MarkupRecord {
            kind: CONTAINER_KIND.to_string(),
            location: Point::new(120, -5),
            serial: 0x4000_0001,
            graphic: Some(0x003C),
            minimized: Some(false),
        };

        let mut writer = Writer::new(Vec::new());
        record.write(&mut writer).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();

        assert!(xml.contains(r#"graphic="60""#));
        assert!(xml.contains(r#"isminimized="False""#));
        assert_eq!(parse_markup_element(&xml).unwrap(), record);
    }

    #[test]
    fn test_parse_markup_document() {
        let xml = r#"
            <gumps>
                <gump type="container" x="10" y="20" serial="1073741825" graphic="60" isminimized="True" />
                <gump type="container" x="30" y="40" serial="1073741826"></gump>
            </gumps>
        "#;

        let records = parse_markup(xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].minimized, Some(true));
        assert_eq!(records[1].graphic, None);
        assert_eq!(records[1].location, Point::new(30, 40));
    }

    #[test]
    fn test_markup_errors() {
        assert!(matches!(
            parse_markup_element(r#"<gump type="container" x="1" y="2" />"#),
            Err(PersistError::MissingAttribute("serial"))
        ));
        assert!(matches!(
            parse_markup_element(r#"<gump type="container" x="one" y="2" serial="1" />"#),
            Err(PersistError::InvalidAttribute { name: "x", .. })
        ));
        assert!(matches!(parse_markup_element("<gumps />"), Err(PersistError::NoElement)));
    }

    #[test]
    fn test_restore_markup_ignores_container_attributes() {
        let record = parse_markup_element(
            r#"<gump type="container" x="1" y="2" serial="98" graphic="not-read" isminimized="maybe" />"#,
        )
        .unwrap();
        assert_eq!(record.graphic, None);
        assert_eq!(record.minimized, None);

        let record = parse_markup_element(
            r#"<gump type="container" x="1" y="2" serial="99" graphic="60" isminimized="True" />"#,
        )
        .unwrap();
        let mut scene = DeferredOpens::default();
        assert_eq!(restore_markup(&record, &mut scene), 99);
        assert_eq!(scene.pop(), Some(99));
    }
}
