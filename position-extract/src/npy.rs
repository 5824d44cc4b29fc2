//! Minimal NumPy writers: `.npy` version 1.0 arrays and SciPy-style CSR
//! `.npz` archives.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::encoder::CsrBuilder;
use crate::error::ExtractError;

const MAGIC: &[u8] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;
/// Magic, two version bytes and the u16 header length.
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => {
            let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", parts.join(", "))
        }
    }
}

pub fn write_header<W: Write>(w: &mut W, descr: &str, shape: &[usize]) -> io::Result<()> {
    let mut header = format!(
        "{{'descr': '{descr}', 'fortran_order': False, 'shape': {}, }}",
        shape_literal(shape)
    );
    let unpadded = PREAMBLE_LEN + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "npy header too long"))?;

    w.write_all(MAGIC)?;
    w.write_all(&[1, 0])?;
    w.write_u16::<LittleEndian>(header_len)?;
    w.write_all(header.as_bytes())
}

pub fn write_i64_array<W, I>(w: &mut W, len: usize, values: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = i64>,
{
    write_header(w, "<i8", &[len])?;
    for v in values {
        w.write_i64::<LittleEndian>(v)?;
    }
    Ok(())
}

pub fn write_i32_array<W, I>(w: &mut W, len: usize, values: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = i32>,
{
    write_header(w, "<i4", &[len])?;
    for v in values {
        w.write_i32::<LittleEndian>(v)?;
    }
    Ok(())
}

pub fn write_f64_array<W: Write>(w: &mut W, values: &[f64]) -> io::Result<()> {
    write_header(w, "<f8", &[values.len()])?;
    for &v in values {
        w.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

pub fn write_shape_array<W: Write>(w: &mut W, dims: &[usize]) -> io::Result<()> {
    write_i64_array(w, dims.len(), dims.iter().map(|&d| d as i64))
}

/// Zero-dimensional unicode array, stored as UTF-32LE.
pub fn write_str_scalar<W: Write>(w: &mut W, value: &str) -> io::Result<()> {
    write_header(w, &format!("<U{}", value.chars().count()), &[])?;
    for ch in value.chars() {
        w.write_u32::<LittleEndian>(ch as u32)?;
    }
    Ok(())
}

/// Writes a one-dimensional `.npy` file via `fill`.
pub fn write_npy_file<F>(path: &Path, fill: F) -> Result<(), ExtractError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path).map_err(|e| ExtractError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    fill(&mut writer).map_err(|e| ExtractError::write(path, e))?;
    writer.flush().map_err(|e| ExtractError::write(path, e))
}

/// Writes `matrix` the way `scipy.sparse.save_npz` lays out a CSR matrix,
/// so `scipy.sparse.load_npz` can read it back.
pub fn write_csr_npz(path: &Path, matrix: &CsrBuilder) -> Result<(), ExtractError> {
    let file = File::create(path).map_err(|e| ExtractError::write(path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let members: [(&str, Vec<u8>); 5] = [
        ("indices.npy", encode(|buf| {
            write_i32_array(buf, matrix.nnz(), matrix.indices().iter().map(|&c| c as i32))
        })?),
        ("indptr.npy", encode(|buf| {
            write_i64_array(buf, matrix.indptr().len(), matrix.indptr().iter().map(|&p| p as i64))
        })?),
        ("format.npy", encode(|buf| write_str_scalar(buf, "csr"))?),
        ("shape.npy", encode(|buf| write_shape_array(buf, &[matrix.rows(), matrix.cols()]))?),
        ("data.npy", encode(|buf| {
            write_i64_array(buf, matrix.nnz(), std::iter::repeat(1).take(matrix.nnz()))
        })?),
    ];

    for (name, bytes) in members {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)
            .map_err(|e| ExtractError::archive(path, e))?;
        zip.write_all(&bytes).map_err(|e| ExtractError::write(path, e))?;
    }

    let mut inner = zip.finish().map_err(|e| ExtractError::archive(path, e))?;
    inner.flush().map_err(|e| ExtractError::write(path, e))
}

fn encode<F>(fill: F) -> Result<Vec<u8>, ExtractError>
where
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut buf = Vec::new();
    // Writes into a Vec cannot fail short of allocation failure.
    fill(&mut buf).map_err(|e| ExtractError::write("<memory>", e))?;
    Ok(buf)
}
