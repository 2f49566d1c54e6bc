//! Closed sum type over all layout variants, with a binary codec

use std::fmt;
use std::io::{Read, Write};

use boundhist_core::wire::{
    read_f64, read_i32, read_u8, read_varint, write_f64, write_signed_varint, write_u8,
    write_varint,
};
use boundhist_core::{Error, Result};

use crate::custom::CustomLayout;
use crate::error_limiting::{ErrorLimitingLayout1, ErrorLimitingLayout2};
use crate::integer::IntegerLayout;
use crate::log_optimal::LogOptimalLayout;
use crate::traits::Layout;

const SERIAL_VERSION: u8 = 0;

const TAG_ERROR_LIMITING1: u8 = 0;
const TAG_ERROR_LIMITING2: u8 = 1;
const TAG_LOG_OPTIMAL: u8 = 2;
const TAG_CUSTOM: u8 = 3;
const TAG_INTEGER: u8 = 4;

/// Any of the built-in layouts
///
/// Dispatches by `match`, so histograms over `AnyLayout` can be built from
/// configuration at runtime while keeping static dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnyLayout {
    ErrorLimiting1(ErrorLimitingLayout1),
    ErrorLimiting2(ErrorLimitingLayout2),
    LogOptimal(LogOptimalLayout),
    Custom(CustomLayout),
    Integer(IntegerLayout),
}

macro_rules! dispatch {
    ($self:expr, $layout:ident => $body:expr) => {
        match $self {
            AnyLayout::ErrorLimiting1($layout) => $body,
            AnyLayout::ErrorLimiting2($layout) => $body,
            AnyLayout::LogOptimal($layout) => $body,
            AnyLayout::Custom($layout) => $body,
            AnyLayout::Integer($layout) => $body,
        }
    };
}

impl Layout for AnyLayout {
    #[inline]
    fn value_to_bin_index(&self, value: f64) -> i32 {
        dispatch!(self, layout => layout.value_to_bin_index(value))
    }

    fn underflow_bin_index(&self) -> i32 {
        dispatch!(self, layout => layout.underflow_bin_index())
    }

    fn overflow_bin_index(&self) -> i32 {
        dispatch!(self, layout => layout.overflow_bin_index())
    }

    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64 {
        dispatch!(self, layout => layout.bin_lower_bound_approximation(bin_index))
    }

    fn bin_lower_bound(&self, bin_index: i32) -> f64 {
        dispatch!(self, layout => layout.bin_lower_bound(bin_index))
    }

    fn bin_upper_bound(&self, bin_index: i32) -> f64 {
        dispatch!(self, layout => layout.bin_upper_bound(bin_index))
    }
}

impl fmt::Display for AnyLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, layout => fmt::Display::fmt(layout, f))
    }
}

impl From<ErrorLimitingLayout1> for AnyLayout {
    fn from(layout: ErrorLimitingLayout1) -> Self {
        Self::ErrorLimiting1(layout)
    }
}

impl From<ErrorLimitingLayout2> for AnyLayout {
    fn from(layout: ErrorLimitingLayout2) -> Self {
        Self::ErrorLimiting2(layout)
    }
}

impl From<LogOptimalLayout> for AnyLayout {
    fn from(layout: LogOptimalLayout) -> Self {
        Self::LogOptimal(layout)
    }
}

impl From<CustomLayout> for AnyLayout {
    fn from(layout: CustomLayout) -> Self {
        Self::Custom(layout)
    }
}

impl From<IntegerLayout> for AnyLayout {
    fn from(layout: IntegerLayout) -> Self {
        Self::Integer(layout)
    }
}

impl AnyLayout {
    /// Write a type tag, the serial version and the layout parameters
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        match self {
            Self::ErrorLimiting1(layout) => {
                write_header(writer, TAG_ERROR_LIMITING1)?;
                write_error_bounded(
                    writer,
                    layout.absolute_bin_width_limit(),
                    layout.relative_bin_width_limit(),
                    layout,
                )
            }
            Self::ErrorLimiting2(layout) => {
                write_header(writer, TAG_ERROR_LIMITING2)?;
                write_error_bounded(
                    writer,
                    layout.absolute_bin_width_limit(),
                    layout.relative_bin_width_limit(),
                    layout,
                )
            }
            Self::LogOptimal(layout) => {
                write_header(writer, TAG_LOG_OPTIMAL)?;
                write_error_bounded(
                    writer,
                    layout.absolute_bin_width_limit(),
                    layout.relative_bin_width_limit(),
                    layout,
                )
            }
            Self::Custom(layout) => {
                write_header(writer, TAG_CUSTOM)?;
                write_varint(writer, layout.boundaries().len() as u64)?;
                for &boundary in layout.boundaries() {
                    write_f64(writer, boundary)?;
                }
                Ok(())
            }
            Self::Integer(layout) => {
                write_header(writer, TAG_INTEGER)?;
                write_signed_varint(writer, i64::from(layout.underflow_bin_index()))?;
                write_signed_varint(writer, i64::from(layout.overflow_bin_index()))
            }
        }
    }

    /// Read a layout written by [`AnyLayout::write`]
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let tag = read_u8(reader)?;
        let version = read_u8(reader)?;
        if version != SERIAL_VERSION {
            tracing::debug!(version, "rejected layout with unsupported serial version");
            return Err(Error::UnsupportedVersion(version));
        }
        let layout = match tag {
            TAG_ERROR_LIMITING1 => {
                let (a, r, u, o) = read_error_bounded(reader)?;
                ErrorLimitingLayout1::from_indices(a, r, u, o).map(Self::from)
            }
            TAG_ERROR_LIMITING2 => {
                let (a, r, u, o) = read_error_bounded(reader)?;
                ErrorLimitingLayout2::from_indices(a, r, u, o).map(Self::from)
            }
            TAG_LOG_OPTIMAL => {
                let (a, r, u, o) = read_error_bounded(reader)?;
                LogOptimalLayout::from_indices(a, r, u, o).map(Self::from)
            }
            TAG_CUSTOM => {
                let len = read_varint(reader)?;
                if len > i32::MAX as u64 {
                    return Err(Error::corrupt(format!("boundary count {len} too large")));
                }
                let mut boundaries = Vec::new();
                for _ in 0..len {
                    boundaries.push(read_f64(reader)?);
                }
                CustomLayout::new(&boundaries).map(Self::from)
            }
            TAG_INTEGER => {
                let underflow = read_i32(reader)?;
                let overflow = read_i32(reader)?;
                IntegerLayout::new(underflow, overflow).map(Self::from)
            }
            other => {
                tracing::debug!(tag = other, "rejected layout with unknown type tag");
                return Err(Error::corrupt(format!("unknown layout tag {other}")));
            }
        };
        layout.map_err(|err| match err {
            Error::InvalidParameter(reason) => Error::Corrupt(reason),
            other => other,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Self::read(&mut bytes)
    }
}

fn write_header<W: Write + ?Sized>(writer: &mut W, tag: u8) -> Result<()> {
    write_u8(writer, tag)?;
    write_u8(writer, SERIAL_VERSION)
}

fn write_error_bounded<W: Write + ?Sized, L: Layout>(
    writer: &mut W,
    absolute: f64,
    relative: f64,
    layout: &L,
) -> Result<()> {
    write_f64(writer, absolute)?;
    write_f64(writer, relative)?;
    write_signed_varint(writer, i64::from(layout.underflow_bin_index()))?;
    write_signed_varint(writer, i64::from(layout.overflow_bin_index()))
}

fn read_error_bounded<R: Read + ?Sized>(reader: &mut R) -> Result<(f64, f64, i32, i32)> {
    let absolute = read_f64(reader)?;
    let relative = read_f64(reader)?;
    let underflow = read_i32(reader)?;
    let overflow = read_i32(reader)?;
    Ok((absolute, relative, underflow, overflow))
}
