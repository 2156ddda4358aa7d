//! Minimal managed side for type-checking generated modules.
//!
//! `native/` is written by the generator before this crate is compiled.

#![allow(dead_code)]

mod native;

use magick_interop::runtime::{
    EnvironmentGuard, ExceptionReader, HasNativeInstance, MagickError, NativeException,
    NativeHandle, NativeInstance, RawException, RawHandle,
};
use native::{
    NativeEnvironment, NativeMagickColor, NativeMagickGeometry, NativeMagickImage,
    NativeMagickSettings,
};

// =========================================================================
// Environment and exceptions
// =========================================================================

pub struct MagickExceptionReader;

impl ExceptionReader for MagickExceptionReader {
    unsafe fn read(raw: RawException) -> NativeException {
        *unsafe { Box::from_raw(raw as *mut NativeException) }
    }
}

static ENVIRONMENT: EnvironmentGuard = EnvironmentGuard::new();

pub fn initialize_environment() {
    ENVIRONMENT.initialize(|| {
        if let Err(err) = NativeEnvironment::initialize() {
            eprintln!("environment initialization failed: {err}");
        }
    });
}

// =========================================================================
// Enums
// =========================================================================

macro_rules! native_enum {
    ($name:ident { $($variant:ident = $value:expr),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $($variant = $value),*
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                [$($name::$variant),*]
                    .into_iter()
                    .find(|v| *v as usize == value)
                    .unwrap_or_default()
            }
        }

        impl From<$name> for usize {
            fn from(value: $name) -> Self {
                value as usize
            }
        }
    };
}

native_enum!(Channels { Undefined = 0, Red = 1, Green = 2, Blue = 4, Alpha = 8 });
native_enum!(ColorSpace { Undefined = 0, Cmyk = 2, Gray = 3, Srgb = 23 });
native_enum!(LayerMethod { Undefined = 0, Coalesce = 1, Flatten = 14, Merge = 16 });

// =========================================================================
// Managed types
// =========================================================================

/// Move the handle out of a wrapper's base without disposing it.
fn take_handle(base: &mut NativeInstance, dispose: unsafe extern "C" fn(RawHandle)) -> NativeHandle {
    let empty = NativeInstance::new(dispose, base.type_name());
    NativeHandle::new(std::mem::replace(base, empty).into_raw(), dispose)
}

pub trait IMagickColor<Q> {
    fn red(&self) -> Q;
    fn green(&self) -> Q;
    fn blue(&self) -> Q;
    fn alpha(&self) -> Q;
}

#[derive(Debug, Default)]
pub struct MagickColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
    handle: Option<NativeHandle>,
}

impl MagickColor {
    pub fn from_raw_handle(instance: RawHandle) -> Self {
        Self {
            handle: Some(NativeHandle::new(instance, NativeMagickColor::dispose_raw)),
            ..Default::default()
        }
    }

    pub fn create_native_instance(color: &dyn IMagickColor<f32>) -> Result<NativeHandle, MagickError> {
        let mut native = NativeMagickColor::new()?;
        native.set_red(color.red())?;
        native.set_green(color.green())?;
        native.set_blue(color.blue())?;
        native.set_alpha(color.alpha())?;
        Ok(take_handle(native.base_mut(), NativeMagickColor::dispose_raw))
    }
}

impl IMagickColor<f32> for MagickColor {
    fn red(&self) -> f32 {
        self.red
    }
    fn green(&self) -> f32 {
        self.green
    }
    fn blue(&self) -> f32 {
        self.blue
    }
    fn alpha(&self) -> f32 {
        self.alpha
    }
}

pub trait IMagickGeometry {
    fn value(&self) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MagickGeometry {
    pub x: isize,
    pub y: isize,
    pub width: usize,
    pub height: usize,
}

impl MagickGeometry {
    pub fn from_native(native: &NativeMagickGeometry) -> Self {
        Self {
            x: native.x().unwrap_or_default(),
            y: native.y().unwrap_or_default(),
            width: native.width().unwrap_or_default(),
            height: native.height().unwrap_or_default(),
        }
    }

    pub fn create_native_instance(geometry: &dyn IMagickGeometry) -> Result<NativeHandle, MagickError> {
        let mut native = NativeMagickGeometry::new()?;
        native.initialize(&geometry.value())?;
        Ok(take_handle(native.base_mut(), NativeMagickGeometry::dispose_raw))
    }
}

impl IMagickGeometry for MagickGeometry {
    fn value(&self) -> String {
        format!("{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

pub trait IMagickSettings {
    fn file_name(&self) -> Option<&str>;
    fn ping(&self) -> bool;
    fn density(&self) -> f64;
}

#[derive(Debug, Clone, Default)]
pub struct MagickSettings {
    pub file_name: Option<String>,
    pub ping: bool,
    pub density: f64,
}

impl MagickSettings {
    pub fn create_native_instance(settings: &dyn IMagickSettings) -> Result<NativeHandle, MagickError> {
        let mut native = NativeMagickSettings::new()?;
        if let Some(file_name) = settings.file_name() {
            native.set_file_name(file_name)?;
        }
        native.set_ping(settings.ping())?;
        native.set_density(settings.density())?;
        Ok(take_handle(native.base_mut(), NativeMagickSettings::dispose_raw))
    }
}

impl IMagickSettings for MagickSettings {
    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
    fn ping(&self) -> bool {
        self.ping
    }
    fn density(&self) -> f64 {
        self.density
    }
}

#[derive(Debug)]
pub struct MagickImage {
    native: Option<NativeMagickImage>,
    width: usize,
    height: usize,
}

impl MagickImage {
    pub fn new() -> Result<Self, MagickError> {
        let native = NativeMagickImage::new()?;
        Ok(Self {
            width: native.width()?,
            height: native.height()?,
            native: Some(native),
        })
    }

    pub fn from_native(native: &NativeMagickImage) -> Self {
        Self {
            native: None,
            width: native.width().unwrap_or_default(),
            height: native.height().unwrap_or_default(),
        }
    }
}

impl HasNativeInstance for MagickImage {
    fn native_instance(&self) -> Result<RawHandle, MagickError> {
        match &self.native {
            Some(native) => native.base().instance(),
            None => Err(MagickError::Disposed(NativeMagickImage::TYPE_NAME)),
        }
    }
}
