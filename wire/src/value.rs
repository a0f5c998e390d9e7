//! Typed values: one tag byte followed by a tag-specific payload.

use crate::buffer::{WireReader, WireWriter};
use crate::constants::*;
use crate::error::{Result, WireError};
use serde::{Deserialize, Serialize};

/// The closed set of value kinds the client understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    LonLat,
    Position2D,
    RoadMap,
    BoundingBox,
    Polygon,
    UByte,
    Byte,
    Int,
    Float,
    Double,
    String,
    StringList,
    Compound,
    Color,
}

impl ValueType {
    pub fn tag(self) -> u8 {
        match self {
            ValueType::LonLat => POSITION_LON_LAT,
            ValueType::Position2D => POSITION_2D,
            ValueType::RoadMap => POSITION_ROADMAP,
            ValueType::BoundingBox => TYPE_BOUNDINGBOX,
            ValueType::Polygon => TYPE_POLYGON,
            ValueType::UByte => TYPE_UBYTE,
            ValueType::Byte => TYPE_BYTE,
            ValueType::Int => TYPE_INTEGER,
            ValueType::Float => TYPE_FLOAT,
            ValueType::Double => TYPE_DOUBLE,
            ValueType::String => TYPE_STRING,
            ValueType::StringList => TYPE_STRINGLIST,
            ValueType::Compound => TYPE_COMPOUND,
            ValueType::Color => TYPE_COLOR,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        let value_type = match tag {
            POSITION_LON_LAT => ValueType::LonLat,
            POSITION_2D => ValueType::Position2D,
            POSITION_ROADMAP => ValueType::RoadMap,
            TYPE_BOUNDINGBOX => ValueType::BoundingBox,
            TYPE_POLYGON => ValueType::Polygon,
            TYPE_UBYTE => ValueType::UByte,
            TYPE_BYTE => ValueType::Byte,
            TYPE_INTEGER => ValueType::Int,
            TYPE_FLOAT => ValueType::Float,
            TYPE_DOUBLE => ValueType::Double,
            TYPE_STRING => ValueType::String,
            TYPE_STRINGLIST => ValueType::StringList,
            TYPE_COMPOUND => ValueType::Compound,
            TYPE_COLOR => ValueType::Color,
            other => return Err(WireError::UnknownType(other)),
        };
        Ok(value_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLatPosition {
    pub lon: f64,
    pub lat: f64,
}

/// A position expressed as an offset along a lane of an edge
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadMapPosition {
    pub edge_id: String,
    pub pos: f64,
    pub lane_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lower_left: Position2D,
    pub upper_right: Position2D,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Position2D>,
}

/// A decoded TraCI value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    UByte(u8),
    Byte(i8),
    Int(i32),
    Float(f32),
    Double(f64),
    String(String),
    StringList(Vec<String>),
    Compound(Vec<Value>),
    Position2D(Position2D),
    LonLat(LonLatPosition),
    RoadMap(RoadMapPosition),
    BoundingBox(BoundingBox),
    Color(Color),
    Polygon(Polygon),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::UByte(_) => ValueType::UByte,
            Value::Byte(_) => ValueType::Byte,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::StringList(_) => ValueType::StringList,
            Value::Compound(_) => ValueType::Compound,
            Value::Position2D(_) => ValueType::Position2D,
            Value::LonLat(_) => ValueType::LonLat,
            Value::RoadMap(_) => ValueType::RoadMap,
            Value::BoundingBox(_) => ValueType::BoundingBox,
            Value::Color(_) => ValueType::Color,
            Value::Polygon(_) => ValueType::Polygon,
        }
    }

    /// Reads a tag and the payload it announces
    pub fn read(reader: &mut WireReader<'_>) -> Result<Value> {
        let value_type = ValueType::from_tag(reader.read_u8()?)?;
        Self::read_payload(reader, value_type)
    }

    /// Reads a tag, fails before touching the payload unless it is `expected`
    pub fn read_expecting(reader: &mut WireReader<'_>, expected: ValueType) -> Result<Value> {
        let tag = reader.read_u8()?;
        if tag != expected.tag() {
            return Err(WireError::UnexpectedType {
                expected: expected.tag(),
                actual: tag,
            });
        }
        Self::read_payload(reader, expected)
    }

    fn read_payload(reader: &mut WireReader<'_>, value_type: ValueType) -> Result<Value> {
        let value = match value_type {
            ValueType::UByte => Value::UByte(reader.read_u8()?),
            ValueType::Byte => Value::Byte(reader.read_i8()?),
            ValueType::Int => Value::Int(reader.read_i32()?),
            ValueType::Float => Value::Float(reader.read_f32()?),
            ValueType::Double => Value::Double(reader.read_f64()?),
            ValueType::String => Value::String(reader.read_string()?),
            ValueType::StringList => Value::StringList(reader.read_string_list()?),
            ValueType::Compound => {
                let count = reader.read_count()?;
                let mut items = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    items.push(Value::read(reader)?);
                }
                Value::Compound(items)
            }
            ValueType::Position2D => Value::Position2D(read_position(reader)?),
            ValueType::LonLat => Value::LonLat(LonLatPosition {
                lon: reader.read_f64()?,
                lat: reader.read_f64()?,
            }),
            ValueType::RoadMap => Value::RoadMap(RoadMapPosition {
                edge_id: reader.read_string()?,
                pos: reader.read_f64()?,
                lane_index: reader.read_u8()?,
            }),
            ValueType::BoundingBox => Value::BoundingBox(BoundingBox {
                lower_left: read_position(reader)?,
                upper_right: read_position(reader)?,
            }),
            ValueType::Color => Value::Color(Color {
                r: reader.read_u8()?,
                g: reader.read_u8()?,
                b: reader.read_u8()?,
                a: reader.read_u8()?,
            }),
            ValueType::Polygon => {
                let count = reader.read_u8()? as usize;
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    points.push(read_position(reader)?);
                }
                Value::Polygon(Polygon { points })
            }
        };
        Ok(value)
    }

    /// Writes the tag followed by the payload
    pub fn write(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u8(self.value_type().tag());
        match self {
            Value::UByte(v) => writer.write_u8(*v),
            Value::Byte(v) => writer.write_i8(*v),
            Value::Int(v) => writer.write_i32(*v),
            Value::Float(v) => writer.write_f32(*v),
            Value::Double(v) => writer.write_f64(*v),
            Value::String(v) => writer.write_string(v)?,
            Value::StringList(v) => writer.write_string_list(v)?,
            Value::Compound(items) => {
                writer.write_count(items.len())?;
                for item in items {
                    item.write(writer)?;
                }
            }
            Value::Position2D(p) => write_position(writer, p),
            Value::LonLat(p) => {
                writer.write_f64(p.lon);
                writer.write_f64(p.lat);
            }
            Value::RoadMap(p) => {
                writer.write_string(&p.edge_id)?;
                writer.write_f64(p.pos);
                writer.write_u8(p.lane_index);
            }
            Value::BoundingBox(b) => {
                write_position(writer, &b.lower_left);
                write_position(writer, &b.upper_right);
            }
            Value::Color(c) => {
                writer.write_u8(c.r);
                writer.write_u8(c.g);
                writer.write_u8(c.b);
                writer.write_u8(c.a);
            }
            Value::Polygon(polygon) => {
                let count = u8::try_from(polygon.points.len())
                    .map_err(|_| WireError::PolygonTooLarge(polygon.points.len()))?;
                writer.write_u8(count);
                for point in &polygon.points {
                    write_position(writer, point);
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = WireWriter::new();
        self.write(&mut writer)?;
        Ok(writer.into_bytes())
    }
}

fn read_position(reader: &mut WireReader<'_>) -> Result<Position2D> {
    Ok(Position2D {
        x: reader.read_f64()?,
        y: reader.read_f64()?,
    })
}

fn write_position(writer: &mut WireWriter, position: &Position2D) {
    writer.write_f64(position.x);
    writer.write_f64(position.y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn round_trip(value: &Value) -> Value {
        let bytes = value.to_bytes().unwrap();
        let mut reader = WireReader::new(&bytes);
        let decoded = Value::read(&mut reader).unwrap();
        assert!(reader.is_empty(), "trailing bytes after {:?}", value);
        decoded
    }

    #[test]
    fn test_scalar_round_trip() {
        let values = vec![
            Value::UByte(255),
            Value::Byte(-128),
            Value::Int(i32::MIN),
            Value::Int(-1),
            Value::Float(1.5),
            Value::Double(f64::MAX),
            Value::String(String::new()),
            Value::String("edge_1#0".to_string()),
            Value::StringList(vec![]),
            Value::Color(Color::rgba(255, 0, 128, 7)),
        ];
        for value in values {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn test_signed_zero_survives() {
        for zero in [0.0f64, -0.0f64] {
            match round_trip(&Value::Double(zero)) {
                Value::Double(decoded) => assert_eq!(decoded.to_bits(), zero.to_bits()),
                other => panic!("wrong variant {:?}", other),
            }
        }
    }

    #[test]
    fn test_long_string_list() {
        let ids: Vec<String> = (0..5000).map(|i| format!("vehicle.{}", i)).collect();
        let value = Value::StringList(ids.clone());
        assert_eq!(round_trip(&value), Value::StringList(ids));
    }

    #[test]
    fn test_positions_round_trip() {
        let values = vec![
            Value::Position2D(Position2D::new(-12.5, 3.25)),
            Value::LonLat(LonLatPosition {
                lon: 13.4,
                lat: 52.5,
            }),
            Value::RoadMap(RoadMapPosition {
                edge_id: "gneE3".to_string(),
                pos: 17.0,
                lane_index: 2,
            }),
            Value::BoundingBox(BoundingBox {
                lower_left: Position2D::new(0.0, -1.0),
                upper_right: Position2D::new(100.0, 250.0),
            }),
            Value::Polygon(Polygon {
                points: vec![Position2D::new(0.0, 0.0), Position2D::new(1.0, 2.0)],
            }),
        ];
        for value in values {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn test_nested_compound() {
        let value = Value::Compound(vec![
            Value::Int(2),
            Value::String("route0".to_string()),
            Value::Compound(vec![Value::Double(0.5)]),
        ]);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn test_bounding_box_dimensions() {
        let bbox = BoundingBox {
            lower_left: Position2D::new(-10.0, 5.0),
            upper_right: Position2D::new(30.0, 7.5),
        };
        assert_approx_eq!(bbox.width(), 40.0);
        assert_approx_eq!(bbox.height(), 2.5);
    }

    #[test]
    fn test_type_mismatch_is_detected_before_payload() {
        let bytes = Value::Int(42).to_bytes().unwrap();
        let mut reader = WireReader::new(&bytes);
        let err = Value::read_expecting(&mut reader, ValueType::Double).unwrap_err();
        assert_eq!(
            err,
            WireError::UnexpectedType {
                expected: TYPE_DOUBLE,
                actual: TYPE_INTEGER
            }
        );
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_unknown_tag() {
        let mut reader = WireReader::new(&[0x42, 0, 0]);
        assert_eq!(Value::read(&mut reader), Err(WireError::UnknownType(0x42)));
    }

    #[test]
    fn test_oversized_polygon_is_rejected() {
        let polygon = Polygon {
            points: vec![Position2D::default(); 256],
        };
        assert_eq!(
            Value::Polygon(polygon).to_bytes(),
            Err(WireError::PolygonTooLarge(256))
        );
    }
}
