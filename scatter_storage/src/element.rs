use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Element type of points and queries, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float,
    Int8,
    Uint8,
}

impl DataType {
    pub fn parse(s: &str) -> Option<DataType> {
        match s {
            "float" => Some(DataType::Float),
            "int8" => Some(DataType::Int8),
            "uint8" => Some(DataType::Uint8),
            _ => None,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            DataType::Float => 4,
            DataType::Int8 | DataType::Uint8 => 1,
        }
    }
}

/// A fixed-width vector element with a little-endian wire form.
pub trait VectorElement: Copy + Send + Sync + 'static {
    const WIDTH: usize;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self>;
    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()>;
    fn to_f32(self) -> f32;
}

impl VectorElement for f32 {
    const WIDTH: usize = 4;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_f32::<LittleEndian>()
    }

    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self)
    }

    fn to_f32(self) -> f32 {
        self
    }
}

impl VectorElement for i8 {
    const WIDTH: usize = 1;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_i8()
    }

    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_i8(self)
    }

    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl VectorElement for u8 {
    const WIDTH: usize = 1;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_u8()
    }

    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self)
    }

    fn to_f32(self) -> f32 {
        self as f32
    }
}
