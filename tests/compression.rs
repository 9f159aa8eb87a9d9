use anyhow::Result;
use parquetflow::io::compression::{CompressionCodec, codec_for_path, create_writer, open_reader, register_codec};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

/// XORs every byte with a fixed key; enough to prove the codec is applied.
struct XorCodec;

struct Xor<T>(T);

impl<R: Read> Read for Xor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.0.read(buf)?;
        buf[..n].iter_mut().for_each(|b| *b ^= 0x5a);
        Ok(n)
    }
}

impl<W: Write> Write for Xor<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let masked: Vec<u8> = buf.iter().map(|b| b ^ 0x5a).collect();
        self.0.write_all(&masked)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl CompressionCodec for XorCodec {
    fn name(&self) -> &str {
        "xor"
    }

    fn extensions(&self) -> &[&str] {
        &[".xor"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn decoder(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(Xor(reader)))
    }

    fn encoder(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(Xor(writer)))
    }
}

#[test]
fn registered_codec_is_used_by_extension() -> Result<()> {
    register_codec(Arc::new(XorCodec));
    assert_eq!(codec_for_path(Path::new("DATA.XOR")).map(|c| c.name().to_string()), Some("xor".into()));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("lines.xor");
    {
        let mut w = create_writer(&path)?;
        w.write_all(b"{\"eventId\":\"x\"}\n")?;
        w.flush()?;
    }
    assert_ne!(std::fs::read(&path)?, b"{\"eventId\":\"x\"}\n");

    let mut text = String::new();
    open_reader(&path)?.read_to_string(&mut text)?;
    assert_eq!(text, "{\"eventId\":\"x\"}\n");
    Ok(())
}

#[test]
fn unknown_extension_reads_plain() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plain.txt");
    std::fs::write(&path, "hello\n")?;
    assert!(codec_for_path(&path).is_none());

    let mut text = String::new();
    open_reader(&path)?.read_to_string(&mut text)?;
    assert_eq!(text, "hello\n");
    Ok(())
}
