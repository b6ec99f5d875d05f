// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;
use std::path::Path;

use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::error::{FmmError, Result};

/// Supported file formats for field I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    /// NumPy .npy format.
    Npy,
    /// MATLAB .mat format (Level 5).
    Mat,
}

/// Infer file format from extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => Ok(FileFormat::Npy),
        Some("mat") => Ok(FileFormat::Mat),
        Some(ext) => Err(FmmError::UnsupportedFileFormat(ext.to_string())),
        None => Err(FmmError::UnsupportedFileFormat(
            "(no extension)".to_string(),
        )),
    }
}

/// Load a scalar field from a .npy file.
pub fn load_npy_field(path: &Path, expected_shape: &[usize]) -> Result<Vec<f64>> {
    // Try f64 first
    let arr: ArrayD<f64> = match ndarray_npy::read_npy(path) {
        Ok(a) => a,
        Err(_) => {
            // Try f32 and promote
            let arr32: ArrayD<f32> = ndarray_npy::read_npy(path)
                .map_err(|e| FmmError::UnsupportedDtype(format!("{}", e)))?;
            arr32.mapv(|v| v as f64)
        }
    };

    let got_shape: Vec<usize> = arr.shape().to_vec();
    if got_shape != expected_shape {
        return Err(FmmError::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: got_shape,
        });
    }

    // Ensure C-contiguous (row-major) layout before extracting raw data.
    // Fortran-order .npy files would otherwise give column-major data.
    Ok(arr.as_standard_layout().iter().copied().collect())
}

/// Save a scalar field to a .npy file.
pub fn save_npy_field(path: &Path, shape: &[usize], data: &[f64]) -> Result<()> {
    let arr = ArrayD::from_shape_vec(IxDyn(shape), data.to_vec())
        .map_err(|e| FmmError::Other(format!("shape error: {}", e)))?;

    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| FmmError::Other(format!("npy write error: {}", e)))?;

    Ok(())
}

/// Load a named scalar field from a .mat file.
pub fn load_mat_field(
    path: &Path,
    variable_name: &str,
    expected_shape: &[usize],
) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mat = matfile::MatFile::parse(&mut reader)
        .map_err(|e| FmmError::Other(format!("MAT parse error: {}", e)))?;

    let available: Vec<String> = mat.arrays().iter().map(|a| a.name().to_string()).collect();

    let array = mat
        .find_by_name(variable_name)
        .ok_or_else(|| FmmError::MatVariableNotFound {
            expected: variable_name.to_string(),
            available,
        })?;

    let data_f64: Vec<f64> = match array.data() {
        matfile::NumericData::Double { real, imag: _ } => real.clone(),
        matfile::NumericData::Single { real, imag: _ } => real.iter().map(|&v| v as f64).collect(),
        _ => {
            return Err(FmmError::UnsupportedDtype(
                "MAT file array is not f64 or f32".to_string(),
            ))
        }
    };

    let mat_shape: Vec<usize> = array.size().to_vec();
    let num_elements: usize = expected_shape.iter().product();

    if data_f64.len() != num_elements {
        return Err(FmmError::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: mat_shape,
        });
    }

    // MAT files store data in column-major order, and the stored shape may be
    // either our shape or its reverse (the column-major convention). Re-layout
    // to row-major either way.
    let ndim = expected_shape.len();

    let shape_matches = mat_shape == expected_shape;
    let reversed: Vec<usize> = expected_shape.iter().rev().cloned().collect();
    let shape_reversed = mat_shape == reversed;

    if !shape_matches && !shape_reversed {
        return Err(FmmError::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: mat_shape,
        });
    }

    let arr = ArrayD::from_shape_vec(IxDyn(&mat_shape).f(), data_f64)
        .map_err(|e| FmmError::Other(format!("shape error: {}", e)))?;

    let result = if shape_reversed && !shape_matches {
        let permutation: Vec<usize> = (0..ndim).rev().collect();
        let transposed = arr.permuted_axes(IxDyn(&permutation));
        transposed.as_standard_layout().iter().copied().collect()
    } else {
        arr.as_standard_layout().iter().copied().collect()
    };

    Ok(result)
}

/// Save a scalar field to a .mat file (Level 5 format).
///
/// Minimal hand-rolled Level 5 MAT writer: the `matfile` crate (v0.5) reads
/// MAT files but does not yet support writing. Uncompressed, one real f64
/// array per file, Level 5 only (no 7/7.3).
///
/// Reference: <https://www.mathworks.com/help/pdf_doc/matlab/matfile_format.pdf>
pub fn save_mat_field(path: &Path, var_name: &str, shape: &[usize], data: &[f64]) -> Result<()> {
    // Convert from row-major to column-major for MAT output
    let arr = ArrayD::from_shape_vec(IxDyn(shape), data.to_vec())
        .map_err(|e| FmmError::Other(format!("shape error: {}", e)))?;
    let t_arr = arr.t();
    let col_major_data: Vec<f64> = t_arr.as_standard_layout().iter().copied().collect();

    // MAT dimensions follow the column-major convention (reversed from ours)
    let mat_dims: Vec<usize> = shape.iter().rev().cloned().collect();

    write_mat_level5(path, var_name, &mat_dims, &col_major_data)?;
    Ok(())
}

/// Level 5 MAT layout: a 128-byte header, then one miMATRIX data element
/// holding array flags, dimensions, name, and real data sub-elements. Every
/// sub-element is an 8-byte tag (type, size) plus data padded to an 8-byte
/// boundary.
fn write_mat_level5(path: &Path, var_name: &str, dimensions: &[usize], data: &[f64]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    // Header: 116 bytes of descriptive text, 8 reserved bytes, version
    // 0x0100, and the little-endian indicator "IM".
    let desc = b"MATLAB 5.0 MAT-file, created by levelset-fmm";
    let mut header_text = [b' '; 116];
    let copy_len = desc.len().min(116);
    header_text[..copy_len].copy_from_slice(&desc[..copy_len]);
    w.write_all(&header_text)?;
    w.write_all(&[0u8; 8])?;
    w.write_all(&0x0100u16.to_le_bytes())?;
    w.write_all(b"IM")?;

    // Sub-element sizes, each rounded up to an 8-byte boundary.
    let array_flags_total: u32 = 16;

    let dims_data_size = (dimensions.len() * 4) as u32;
    let dims_padded = dims_data_size.div_ceil(8) * 8;
    let dims_total = 8 + dims_padded;

    let name_bytes = var_name.as_bytes();
    let name_data_size = name_bytes.len() as u32;
    let name_padded = name_data_size.div_ceil(8) * 8;
    let name_total = 8 + name_padded;

    let real_data_size = real_data_bytes(data.len())?;
    // f64 data is already 8-byte aligned, no padding needed
    let real_total = 8 + u64::from(real_data_size);

    let matrix_data_size = u32::try_from(
        u64::from(array_flags_total) + u64::from(dims_total) + u64::from(name_total) + real_total,
    )
    .map_err(|_| FmmError::Other("MAT element size exceeds the Level 5 limit".to_string()))?;

    // miMATRIX tag (type 14) covering all sub-elements
    w.write_all(&14u32.to_le_bytes())?;
    w.write_all(&matrix_data_size.to_le_bytes())?;

    // Array flags: miUINT32 pair, class mxDOUBLE_CLASS = 6, no flags set
    w.write_all(&6u32.to_le_bytes())?;
    w.write_all(&8u32.to_le_bytes())?;
    w.write_all(&6u32.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;

    // Dimensions: miINT32 array
    w.write_all(&5u32.to_le_bytes())?;
    w.write_all(&dims_data_size.to_le_bytes())?;
    for &d in dimensions {
        w.write_all(&(d as i32).to_le_bytes())?;
    }
    let dims_pad = (dims_padded - dims_data_size) as usize;
    if dims_pad > 0 {
        w.write_all(&vec![0u8; dims_pad])?;
    }

    // Array name: miINT8 byte array, no null terminator
    w.write_all(&1u32.to_le_bytes())?;
    w.write_all(&name_data_size.to_le_bytes())?;
    w.write_all(name_bytes)?;
    let name_pad = (name_padded - name_data_size) as usize;
    if name_pad > 0 {
        w.write_all(&vec![0u8; name_pad])?;
    }

    // Real part: miDOUBLE array in column-major order
    w.write_all(&9u32.to_le_bytes())?;
    w.write_all(&real_data_size.to_le_bytes())?;
    for &val in data {
        w.write_all(&val.to_le_bytes())?;
    }

    w.flush()?;
    Ok(())
}

/// Byte size of the real-data sub-element. Level 5 element tags carry
/// 32-bit sizes, which caps a single array payload at 4 GiB.
fn real_data_bytes(num_values: usize) -> Result<u32> {
    num_values
        .checked_mul(8)
        .and_then(|bytes| u32::try_from(bytes).ok())
        .ok_or_else(|| {
            FmmError::Other(format!(
                "array of {} values is too large for a Level 5 MAT file",
                num_values
            ))
        })
}

/// Load a scalar field from a file, inferring format from the extension.
/// For MAT files the field is looked up by `variable_name`.
pub fn load_field(path: &Path, variable_name: &str, expected_shape: &[usize]) -> Result<Vec<f64>> {
    match infer_format(path)? {
        FileFormat::Npy => load_npy_field(path, expected_shape),
        FileFormat::Mat => load_mat_field(path, variable_name, expected_shape),
    }
}

/// Save a scalar field to a file, inferring format from the extension.
/// For MAT files the array is stored under `variable_name`.
pub fn save_field(path: &Path, variable_name: &str, shape: &[usize], data: &[f64]) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => save_npy_field(path, shape, data),
        FileFormat::Mat => save_mat_field(path, variable_name, shape, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_field() -> Vec<f64> {
        (0..16).map(|i| i as f64).collect()
    }

    #[test]
    fn npy_roundtrip() {
        let tmp = std::env::temp_dir().join("fmm_test_roundtrip.npy");
        save_npy_field(&tmp, &[4, 4], &ramp_field()).unwrap();

        let loaded = load_npy_field(&tmp, &[4, 4]).unwrap();
        for i in 0..16 {
            let expected = i as f64;
            assert!(
                (loaded[i] - expected).abs() < 1e-10,
                "mismatch at {}: {} vs {}",
                i,
                loaded[i],
                expected
            );
        }
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn npy_shape_mismatch() {
        let tmp = std::env::temp_dir().join("fmm_test_shape_mismatch.npy");
        save_npy_field(&tmp, &[4, 4], &ramp_field()).unwrap();

        let result = load_npy_field(&tmp, &[3, 3]);
        assert!(matches!(result, Err(FmmError::ShapeMismatch { .. })));
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn mat_roundtrip() {
        let tmp = std::env::temp_dir().join("fmm_test_roundtrip.mat");
        save_mat_field(&tmp, "distance", &[4, 4], &ramp_field()).unwrap();

        // Read back with matfile crate
        let file = std::fs::File::open(&tmp).unwrap();
        let mut reader = std::io::BufReader::new(file);
        let mat = matfile::MatFile::parse(&mut reader).unwrap();
        let arr = mat.find_by_name("distance").unwrap();

        match arr.data() {
            matfile::NumericData::Double { real, imag: _ } => {
                assert_eq!(real.len(), 16);
            }
            _ => panic!("Expected double data"),
        }

        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn mat_write_read_values() {
        let tmp = std::env::temp_dir().join("fmm_test_mat_values.mat");
        save_mat_field(&tmp, "phi", &[4, 4], &ramp_field()).unwrap();

        // Read back and verify values match (accounting for col/row major)
        let loaded = load_mat_field(&tmp, "phi", &[4, 4]).unwrap();
        for i in 0..16 {
            let expected = i as f64;
            assert!(
                (loaded[i] - expected).abs() < 1e-10,
                "mat roundtrip mismatch at {}: {} vs {}",
                i,
                loaded[i],
                expected
            );
        }
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn mat_variable_not_found() {
        let tmp = std::env::temp_dir().join("fmm_test_mat_missing_var.mat");
        save_mat_field(&tmp, "phi", &[4, 4], &ramp_field()).unwrap();

        let result = load_mat_field(&tmp, "mask", &[4, 4]);
        assert!(matches!(
            result,
            Err(FmmError::MatVariableNotFound { .. })
        ));
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn mat_payload_size_limit() {
        assert_eq!(real_data_bytes(16).unwrap(), 128);
        // 2^40 f64 values overflow the 32-bit element size field
        let result = real_data_bytes(1usize << 40);
        assert!(matches!(result, Err(FmmError::Other(_))));
    }

    #[test]
    fn unsupported_format() {
        let path = Path::new("test.xyz");
        let result = infer_format(path);
        assert!(matches!(result, Err(FmmError::UnsupportedFileFormat(_))));
    }
}
