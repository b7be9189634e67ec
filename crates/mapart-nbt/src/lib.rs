use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// Named Binary Tag value. Compounds keep their entries in insertion order, so written
/// files are reproducible between runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Vec<(String, Tag)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn read_len<R: Read>(reader: &mut R) -> io::Result<usize> {
    let length = reader.read_i32::<BigEndian>()?;
    usize::try_from(length).map_err(|_| invalid_data(format!("Negative length: {}", length)))
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let len = i32::try_from(len).map_err(|_| invalid_data(format!("Length too large: {}", len)))?;
    writer.write_i32::<BigEndian>(len)
}

fn read_str<R: Read>(reader: &mut R) -> io::Result<String> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| invalid_data(e.to_string()))
}

fn write_str<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| invalid_data(format!("String too long: {} bytes", value.len())))?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(value.as_bytes())
}

impl Tag {
    pub fn tag_id(&self) -> u8 {
        match self {
            Tag::End => 0,
            Tag::Byte(_) => 1,
            Tag::Short(_) => 2,
            Tag::Int(_) => 3,
            Tag::Long(_) => 4,
            Tag::Float(_) => 5,
            Tag::Double(_) => 6,
            Tag::ByteArray(_) => 7,
            Tag::String(_) => 8,
            Tag::List(_) => 9,
            Tag::Compound(_) => 10,
            Tag::IntArray(_) => 11,
            Tag::LongArray(_) => 12,
        }
    }

    /// Builds a compound from `(name, tag)` pairs, keeping their order.
    pub fn compound<I, S>(entries: I) -> Tag
    where
        I: IntoIterator<Item = (S, Tag)>,
        S: Into<String>,
    {
        Tag::Compound(
            entries
                .into_iter()
                .map(|(name, tag)| (name.into(), tag))
                .collect(),
        )
    }

    pub fn int_list(values: &[i32]) -> Tag {
        Tag::List(values.iter().map(|&v| Tag::Int(v)).collect())
    }

    /// Looks up a compound entry by name.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        match self {
            Tag::Compound(entries) => entries
                .iter()
                .find(|(entry_name, _)| entry_name == name)
                .map(|(_, tag)| tag),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Reads one named tag.
    pub fn read<R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == 0 {
            return Ok((String::new(), Tag::End));
        }
        let name = read_str(reader)?;
        let tag = Tag::read_payload(reader, type_id)?;
        Ok((name, tag))
    }

    fn read_payload<R: Read>(reader: &mut R, type_id: u8) -> io::Result<Tag> {
        let tag = match type_id {
            0 => Tag::End,
            1 => Tag::Byte(reader.read_i8()?),
            2 => Tag::Short(reader.read_i16::<BigEndian>()?),
            3 => Tag::Int(reader.read_i32::<BigEndian>()?),
            4 => Tag::Long(reader.read_i64::<BigEndian>()?),
            5 => Tag::Float(reader.read_f32::<BigEndian>()?),
            6 => Tag::Double(reader.read_f64::<BigEndian>()?),
            7 => {
                let mut bytes = vec![0i8; read_len(reader)?];
                reader.read_i8_into(&mut bytes)?;
                Tag::ByteArray(bytes)
            }
            8 => Tag::String(read_str(reader)?),
            9 => {
                let element_type = reader.read_u8()?;
                let length = read_len(reader)?;
                let mut list = Vec::with_capacity(length);
                for _ in 0..length {
                    list.push(Tag::read_payload(reader, element_type)?);
                }
                Tag::List(list)
            }
            10 => {
                let mut entries = Vec::new();
                loop {
                    match Tag::read(reader)? {
                        (_, Tag::End) => break,
                        entry => entries.push(entry),
                    }
                }
                Tag::Compound(entries)
            }
            11 => {
                let mut ints = vec![0i32; read_len(reader)?];
                reader.read_i32_into::<BigEndian>(&mut ints)?;
                Tag::IntArray(ints)
            }
            12 => {
                let mut longs = vec![0i64; read_len(reader)?];
                reader.read_i64_into::<BigEndian>(&mut longs)?;
                Tag::LongArray(longs)
            }
            other => return Err(invalid_data(format!("Invalid tag type: {}", other))),
        };
        Ok(tag)
    }

    /// Writes this tag with the given name. `End` carries no name.
    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.tag_id())?;
        if matches!(self, Tag::End) {
            return Ok(());
        }
        write_str(writer, name)?;
        self.write_payload(writer)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
            Tag::ByteArray(v) => {
                write_len(writer, v.len())?;
                v.iter().try_for_each(|&b| writer.write_i8(b))
            }
            Tag::String(v) => write_str(writer, v),
            Tag::List(v) => {
                // elements must share one type; the first decides it
                let element_type = v.first().map_or(0, Tag::tag_id);
                if let Some(stray) = v.iter().find(|t| t.tag_id() != element_type) {
                    return Err(invalid_data(format!(
                        "List of type {} contains tag of type {}",
                        element_type,
                        stray.tag_id()
                    )));
                }
                writer.write_u8(element_type)?;
                write_len(writer, v.len())?;
                v.iter().try_for_each(|tag| tag.write_payload(writer))
            }
            Tag::Compound(entries) => {
                for (name, tag) in entries {
                    tag.write(writer, name)?;
                }
                Tag::End.write(writer, "")
            }
            Tag::IntArray(v) => {
                write_len(writer, v.len())?;
                v.iter().try_for_each(|&i| writer.write_i32::<BigEndian>(i))
            }
            Tag::LongArray(v) => {
                write_len(writer, v.len())?;
                v.iter().try_for_each(|&l| writer.write_i64::<BigEndian>(l))
            }
        }
    }
}

/// A complete NBT document: one named root tag, optionally gzip-compressed on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub name: String,
    pub root: Tag,
}

impl NbtFile {
    pub fn new(name: impl Into<String>, root: Tag) -> Self {
        NbtFile {
            name: name.into(),
            root,
        }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let (name, root) = Tag::read(reader)?;
        Ok(NbtFile { name, root })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.root.write(writer, &self.name)
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> io::Result<Self> {
        Self::read(&mut GzDecoder::new(reader))
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}
