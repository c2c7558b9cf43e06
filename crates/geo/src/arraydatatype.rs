use std::str::FromStr;

use inf::cast::saturating_cast;

use crate::Error;

/// Pixel data type of a raster band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArrayDataType {
    Int8 = 0,
    Uint8 = 1,
    Int16 = 2,
    Uint16 = 3,
    Int32 = 4,
    Uint32 = 5,
    Int64 = 6,
    Uint64 = 7,
    Float32 = 8,
    Float64 = 9,
}

impl ArrayDataType {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// The value that ends up in a band of this type when `value` is stored.
    /// Integer types round to the nearest integer and saturate at the bounds of the type.
    pub fn storage_value(&self, value: f64) -> f64 {
        let value = if self.is_floating_point() { value } else { value.round() };

        match self {
            Self::Int8 => saturating_cast::<i8>(value),
            Self::Uint8 => saturating_cast::<u8>(value),
            Self::Int16 => saturating_cast::<i16>(value),
            Self::Uint16 => saturating_cast::<u16>(value),
            Self::Int32 => saturating_cast::<i32>(value),
            Self::Uint32 => saturating_cast::<u32>(value),
            Self::Int64 => saturating_cast::<i64>(value),
            Self::Uint64 => saturating_cast::<u64>(value),
            Self::Float32 => saturating_cast::<f32>(value),
            Self::Float64 => value,
        }
    }
}

impl std::fmt::Display for ArrayDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for ArrayDataType {
    type Err = Error;

    /// Accepts the lowercase names used by [`ArrayDataType::to_str`] and the GDAL type names (e.g. `Byte`, `Float32`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "int8" => Self::Int8,
            "uint8" | "byte" => Self::Uint8,
            "int16" => Self::Int16,
            "uint16" => Self::Uint16,
            "int32" => Self::Int32,
            "uint32" => Self::Uint32,
            "int64" => Self::Int64,
            "uint64" => Self::Uint64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            _ => return Err(Error::InvalidArgument(format!("Unknown pixel data type: {s}"))),
        })
    }
}

#[cfg(feature = "gdal")]
impl TryFrom<gdal::raster::GdalDataType> for ArrayDataType {
    type Error = Error;

    fn try_from(value: gdal::raster::GdalDataType) -> Result<Self, Self::Error> {
        // GDAL type names match the accepted names apart from casing ("Byte", "UInt16", "Float32", ...)
        value
            .name()
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("Unsupported GDAL data type: {}", value.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_data_type() {
        assert_eq!("Byte".parse::<ArrayDataType>().ok(), Some(ArrayDataType::Uint8));
        assert_eq!("float32".parse::<ArrayDataType>().ok(), Some(ArrayDataType::Float32));
        assert_eq!("Int16".parse::<ArrayDataType>().ok(), Some(ArrayDataType::Int16));
        assert!("complex".parse::<ArrayDataType>().is_err());
    }

    #[test]
    fn storage_value() {
        assert_eq!(ArrayDataType::Uint8.storage_value(254.6), 255.0);
        assert_eq!(ArrayDataType::Uint8.storage_value(-12.0), 0.0);
        assert_eq!(ArrayDataType::Int16.storage_value(-2.4), -2.0);
        assert_eq!(ArrayDataType::Float64.storage_value(0.1), 0.1);
        assert_eq!(ArrayDataType::Float32.storage_value(0.5), 0.5);
        assert_eq!(ArrayDataType::Uint16.storage_value(f64::NAN), 0.0);
        assert!(ArrayDataType::Float32.storage_value(f64::NAN).is_nan());
    }
}
