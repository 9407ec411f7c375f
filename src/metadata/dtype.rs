use crate::types::{DataType, Endian};

// ---------------------------------------------------------------------------
// NumPy dtype strings
// ---------------------------------------------------------------------------

/// An element type as described by the server: the core [`DataType`] plus
/// the byte order it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementType {
    pub data_type: DataType,
    pub byte_order: Endian,
}

impl ElementType {
    pub fn new(data_type: DataType, byte_order: Endian) -> Self {
        Self {
            data_type,
            byte_order,
        }
    }

    /// Render as a NumPy type string, e.g. `"<i8"`.
    pub fn to_numpy_str(&self) -> String {
        let (code, size) = self.data_type.numpy_code();
        let order = match self.data_type.byte_size() {
            Some(1) | None => Endian::NotApplicable,
            _ => self.byte_order,
        };
        format!("{}{code}{size}", order.numpy_char())
    }
}

/// Parse a dtype description: either a NumPy type string (`"<f8"`, `"|b1"`)
/// or a NumPy type name (`"float64"`). Names are taken as little-endian.
pub fn parse_dtype(s: &str) -> Result<ElementType, String> {
    if let Some(data_type) = DataType::from_numpy_name(s) {
        let byte_order = match data_type.byte_size() {
            Some(1) => Endian::NotApplicable,
            _ => Endian::Little,
        };
        return Ok(ElementType::new(data_type, byte_order));
    }
    parse_numpy_typestr(s)
}

fn parse_numpy_typestr(s: &str) -> Result<ElementType, String> {
    let mut chars = s.chars();
    let (Some(order), Some(code)) = (chars.next(), chars.next()) else {
        return Err(format!("NumPy format string too short: {s}"));
    };
    let byte_order = match order {
        '<' => Endian::Little,
        '>' => Endian::Big,
        '|' | '=' => Endian::NotApplicable,
        _ => return Err(format!("Invalid byte order: {order}")),
    };

    let rest = chars.as_str();
    let byte_size: usize = rest
        .parse()
        .map_err(|_| format!("Invalid byte size: {rest}"))?;
    if byte_size == 0 {
        return Err(format!("Byte size must be > 0, got {rest}"));
    }

    let data_type = match (code, byte_size) {
        ('b', 1) => DataType::Bool,
        ('i', 1) => DataType::Int8,
        ('i', 2) => DataType::Int16,
        ('i', 4) => DataType::Int32,
        ('i', 8) => DataType::Int64,
        ('u', 1) => DataType::UInt8,
        ('u', 2) => DataType::UInt16,
        ('u', 4) => DataType::UInt32,
        ('u', 8) => DataType::UInt64,
        ('f', 2) => DataType::Float16,
        ('f', 4) => DataType::Float32,
        ('f', 8) => DataType::Float64,
        ('c', 8) => DataType::Complex64,
        ('c', 16) => DataType::Complex128,
        ('S', _) | ('U', _) => DataType::String,
        ('V', _) => DataType::Bytes,
        _ => return Err(format!("Unsupported NumPy type: {code}{byte_size}")),
    };

    Ok(ElementType::new(data_type, byte_order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typestr_and_names() {
        assert_eq!(
            parse_dtype("<i8").unwrap(),
            ElementType::new(DataType::Int64, Endian::Little)
        );
        assert_eq!(
            parse_dtype(">f4").unwrap(),
            ElementType::new(DataType::Float32, Endian::Big)
        );
        assert_eq!(
            parse_dtype("int64").unwrap(),
            ElementType::new(DataType::Int64, Endian::Little)
        );
        assert_eq!(parse_dtype("|b1").unwrap().data_type, DataType::Bool);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_dtype("").is_err());
        assert!(parse_dtype("<x8").is_err());
        assert!(parse_dtype("<i0").is_err());
        assert!(parse_dtype("#i8").is_err());
    }

    #[test]
    fn renders_numpy_str() {
        assert_eq!(
            ElementType::new(DataType::Int64, Endian::Little).to_numpy_str(),
            "<i8"
        );
        assert_eq!(
            ElementType::new(DataType::UInt8, Endian::Little).to_numpy_str(),
            "|u1"
        );
        assert_eq!(
            ElementType::new(DataType::Complex128, Endian::Big).to_numpy_str(),
            ">c16"
        );
    }
}
