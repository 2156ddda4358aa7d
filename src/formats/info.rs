//! Format descriptions and the seam to the native coder list.

use super::format::MagickFormat;
use crate::runtime::{
    ExceptionReader, MagickError, Outcome, RawException, RawHandle, Utf8Marshaler, process_sink,
};
use serde::Serialize;
use std::ffi::c_char;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ptr;

/// What the native library reports about one coder.
///
/// Names are native spellings (`PNG`, `3FR`, `RADIAL-GRADIENT`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeFormatRecord {
    pub name: String,
    pub description: String,
    pub mime_type: Option<String>,
    pub module: String,
    pub is_readable: bool,
    pub is_writable: bool,
    pub is_multi_frame: bool,
    pub can_read_multithreaded: bool,
    pub can_write_multithreaded: bool,
}

/// Information about an image format.
///
/// Two infos are equal when they describe the same format.
#[derive(Debug, Clone, Serialize)]
pub struct FormatInfo {
    pub format: MagickFormat,
    pub description: String,
    pub mime_type: Option<String>,
    pub module_format: MagickFormat,
    pub is_readable: bool,
    pub is_writable: bool,
    pub is_multi_frame: bool,
    pub can_read_multithreaded: bool,
    pub can_write_multithreaded: bool,
}

impl FormatInfo {
    /// `None` when the record's name has no [`MagickFormat`].
    pub fn from_record(record: &NativeFormatRecord) -> Option<Self> {
        let format = MagickFormat::from_native_name(&record.name)?;
        Some(Self {
            format,
            description: record.description.clone(),
            mime_type: record.mime_type.clone(),
            module_format: MagickFormat::from_native_name(&record.module)
                .unwrap_or(MagickFormat::Unknown),
            is_readable: record.is_readable,
            is_writable: record.is_writable,
            is_multi_frame: record.is_multi_frame,
            can_read_multithreaded: record.can_read_multithreaded,
            can_write_multithreaded: record.can_write_multithreaded,
        })
    }
}

impl PartialEq for FormatInfo {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
    }
}

impl Eq for FormatInfo {}

impl Hash for FormatInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.format.hash(state);
    }
}

fn flag(value: bool) -> char {
    if value { '+' } else { '-' }
}

impl fmt::Display for FormatInfo {
    /// `Png: Portable Network Graphics (+R+W-M)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}R{}W{}M)",
            self.format,
            self.description,
            flag(self.is_readable),
            flag(self.is_writable),
            flag(self.is_multi_frame)
        )
    }
}

// ============================================================================
// Format sources
// ============================================================================

/// Where the registry gets its coders from.
pub trait FormatSource {
    /// Every coder in the native bulk list.
    fn formats(&self) -> Result<Vec<NativeFormatRecord>, MagickError>;

    /// One coder by native name. Finds stealth coders the bulk list omits.
    fn format_by_name(&self, name: &str) -> Result<Option<NativeFormatRecord>, MagickError>;
}

/// A fixed set of records, for hosts that enumerate coders themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticFormatSource {
    pub listed: Vec<NativeFormatRecord>,
    /// Found by name only.
    pub stealth: Vec<NativeFormatRecord>,
}

impl FormatSource for StaticFormatSource {
    fn formats(&self) -> Result<Vec<NativeFormatRecord>, MagickError> {
        Ok(self.listed.clone())
    }

    fn format_by_name(&self, name: &str) -> Result<Option<NativeFormatRecord>, MagickError> {
        Ok(self
            .listed
            .iter()
            .chain(&self.stealth)
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .cloned())
    }
}

pub type ListDisposeFn = unsafe extern "C" fn(list: RawHandle, length: usize);

/// A native array of coder handles, released on drop.
///
/// Elements are read at a fixed pointer stride from the start of the list.
pub struct NativeFormatList {
    list: RawHandle,
    length: usize,
    dispose: ListDisposeFn,
}

impl NativeFormatList {
    /// # Safety
    ///
    /// `list` must be null or point to `length` consecutive handles that stay
    /// valid until `dispose(list, length)` is called.
    pub unsafe fn from_raw(list: RawHandle, length: usize, dispose: ListDisposeFn) -> Self {
        Self {
            list,
            length,
            dispose,
        }
    }

    pub fn len(&self) -> usize {
        if self.list.is_null() { 0 } else { self.length }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<RawHandle> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: index < length and the list holds `length` handles.
        Some(unsafe { *(self.list as *const RawHandle).add(index) })
    }

    /// Non-null elements in list order.
    pub fn iter(&self) -> impl Iterator<Item = RawHandle> + '_ {
        (0..self.len())
            .filter_map(|i| self.get(i))
            .filter(|handle| !handle.is_null())
    }
}

impl Drop for NativeFormatList {
    fn drop(&mut self) {
        if !self.list.is_null() {
            unsafe { (self.dispose)(self.list, self.length) };
            self.list = ptr::null_mut();
        }
    }
}

/// Native exports behind [`NativeFormatSource`].
#[derive(Clone, Copy)]
pub struct FormatExports {
    pub create_list: unsafe extern "C" fn(length: *mut usize, exception: *mut RawException) -> RawHandle,
    pub dispose_list: ListDisposeFn,
    pub info_by_name: unsafe extern "C" fn(name: *const c_char, exception: *mut RawException) -> RawHandle,
    /// Reads the properties of one coder handle.
    pub read_info: unsafe fn(info: RawHandle) -> NativeFormatRecord,
}

/// Enumerates coders through the native library.
pub struct NativeFormatSource<R> {
    exports: FormatExports,
    reader: PhantomData<R>,
}

impl<R: ExceptionReader> NativeFormatSource<R> {
    /// # Safety
    ///
    /// Every export must follow the native calling contract of its signature.
    pub unsafe fn new(exports: FormatExports) -> Self {
        Self {
            exports,
            reader: PhantomData,
        }
    }
}

impl<R: ExceptionReader> FormatSource for NativeFormatSource<R> {
    fn formats(&self) -> Result<Vec<NativeFormatRecord>, MagickError> {
        let mut length = 0usize;
        let mut exception: RawException = ptr::null_mut();
        let dispose = self.exports.dispose_list;
        let outcome = unsafe {
            let result = (self.exports.create_list)(&mut length, &mut exception);
            Outcome::capture_or_cleanup::<R, _>(result, exception, |result| {
                dispose(result, length)
            })
        };
        let raw = outcome.into_result(process_sink())?;

        let list = unsafe { NativeFormatList::from_raw(raw, length, dispose) };
        let records = list
            .iter()
            .map(|info| unsafe { (self.exports.read_info)(info) })
            .collect();
        Ok(records)
    }

    fn format_by_name(&self, name: &str) -> Result<Option<NativeFormatRecord>, MagickError> {
        let name = Utf8Marshaler::managed_to_native(name)?;
        let mut exception: RawException = ptr::null_mut();
        let outcome = unsafe {
            let result = (self.exports.info_by_name)(name.as_ptr(), &mut exception);
            Outcome::capture::<R>(result, exception)
        };
        let info = outcome.into_result(process_sink())?;
        if info.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { (self.exports.read_info)(info) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_support::{BoxedExceptionReader, raise};
    use std::collections::HashSet;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(name: &str, description: &str) -> NativeFormatRecord {
        NativeFormatRecord {
            name: name.to_string(),
            description: description.to_string(),
            module: name.to_string(),
            is_readable: true,
            is_writable: true,
            ..Default::default()
        }
    }

    // =========================================================================
    // FormatInfo
    // =========================================================================

    #[test]
    fn display_shows_capability_flags() {
        let info = FormatInfo::from_record(&record("PNG", "Portable Network Graphics")).unwrap();
        assert_eq!(info.to_string(), "Png: Portable Network Graphics (+R+W-M)");

        let mut gif = record("GIF", "CompuServe graphics interchange format");
        gif.is_writable = false;
        gif.is_multi_frame = true;
        let info = FormatInfo::from_record(&gif).unwrap();
        assert_eq!(info.to_string(), "Gif: CompuServe graphics interchange format (+R-W+M)");
    }

    #[test]
    fn record_names_are_normalized() {
        let mut raw = record("3FR", "Hasselblad CFV/H3D39II");
        raw.module = "DNG".into();
        let info = FormatInfo::from_record(&raw).unwrap();
        assert_eq!(info.format, MagickFormat::ThreeFr);
        assert_eq!(info.module_format, MagickFormat::Dng);
    }

    #[test]
    fn unknown_record_name_is_skipped() {
        assert!(FormatInfo::from_record(&record("NOT-A-CODER", "?")).is_none());
    }

    #[test]
    fn unknown_module_falls_back() {
        let mut raw = record("PNG", "Portable Network Graphics");
        raw.module = "nope".into();
        let info = FormatInfo::from_record(&raw).unwrap();
        assert_eq!(info.module_format, MagickFormat::Unknown);
    }

    #[test]
    fn equality_and_hash_use_format_only() {
        let a = FormatInfo::from_record(&record("PNG", "one")).unwrap();
        let mut b = FormatInfo::from_record(&record("PNG", "two")).unwrap();
        b.is_writable = false;
        assert_eq!(a, b);

        let set: HashSet<FormatInfo> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    // =========================================================================
    // StaticFormatSource
    // =========================================================================

    #[test]
    fn static_source_finds_stealth_by_name() {
        let source = StaticFormatSource {
            listed: vec![record("PNG", "png")],
            stealth: vec![record("DIB", "dib")],
        };
        assert_eq!(source.formats().unwrap().len(), 1);
        assert_eq!(source.format_by_name("dib").unwrap().unwrap().name, "DIB");
        assert!(source.format_by_name("TIF").unwrap().is_none());
    }

    // =========================================================================
    // Native list and source
    // =========================================================================

    static LIST_DISPOSALS: AtomicUsize = AtomicUsize::new(0);

    /// Coder handles point at leaked C strings holding the coder name.
    fn coder(name: &'static CStr) -> RawHandle {
        name.as_ptr() as RawHandle
    }

    fn leak_list(handles: Vec<RawHandle>) -> (RawHandle, usize) {
        let length = handles.len();
        let boxed = handles.into_boxed_slice();
        (Box::into_raw(boxed) as *mut RawHandle as RawHandle, length)
    }

    unsafe extern "C" fn dispose_list(list: RawHandle, length: usize) {
        let slice = ptr::slice_from_raw_parts_mut(list as *mut RawHandle, length);
        drop(unsafe { Box::from_raw(slice) });
        LIST_DISPOSALS.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn create_list(length: *mut usize, _exception: *mut RawException) -> RawHandle {
        let (list, len) = leak_list(vec![coder(c"PNG"), ptr::null_mut(), coder(c"GIF")]);
        unsafe { *length = len };
        list
    }

    unsafe extern "C" fn failing_create_list(length: *mut usize, exception: *mut RawException) -> RawHandle {
        let (list, len) = leak_list(vec![coder(c"PNG")]);
        unsafe {
            *length = len;
            *exception = raise(410, "no coders");
        }
        list
    }

    unsafe extern "C" fn info_by_name(name: *const c_char, _exception: *mut RawException) -> RawHandle {
        match unsafe { CStr::from_ptr(name) }.to_bytes() {
            b"DIB" => coder(c"DIB"),
            _ => ptr::null_mut(),
        }
    }

    unsafe fn read_info(info: RawHandle) -> NativeFormatRecord {
        let name = unsafe { CStr::from_ptr(info as *const c_char) };
        record(&name.to_string_lossy(), "native")
    }

    fn exports() -> FormatExports {
        FormatExports {
            create_list,
            dispose_list,
            info_by_name,
            read_info,
        }
    }

    #[test]
    fn native_list_reads_at_fixed_stride() {
        let (raw, length) = leak_list(vec![coder(c"A"), ptr::null_mut(), coder(c"B")]);
        let before = LIST_DISPOSALS.load(Ordering::SeqCst);
        {
            let list = unsafe { NativeFormatList::from_raw(raw, length, dispose_list) };
            assert_eq!(list.len(), 3);
            assert_eq!(list.get(0), Some(coder(c"A")));
            assert_eq!(list.get(1), Some(ptr::null_mut()));
            assert_eq!(list.get(3), None);
            assert_eq!(list.iter().count(), 2);
        }
        assert!(LIST_DISPOSALS.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn null_list_is_empty_and_not_disposed() {
        let list = unsafe { NativeFormatList::from_raw(ptr::null_mut(), 5, dispose_list) };
        assert!(list.is_empty());
        assert_eq!(list.get(0), None);
    }

    #[test]
    fn native_source_enumerates_and_skips_null_entries() {
        let source = unsafe { NativeFormatSource::<BoxedExceptionReader>::new(exports()) };
        let names: Vec<String> = source.formats().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["PNG", "GIF"]);
    }

    #[test]
    fn native_source_lookup_by_name() {
        let source = unsafe { NativeFormatSource::<BoxedExceptionReader>::new(exports()) };
        assert_eq!(source.format_by_name("DIB").unwrap().unwrap().name, "DIB");
        assert!(source.format_by_name("TIF").unwrap().is_none());
        assert!(matches!(
            source.format_by_name("bad\0name"),
            Err(MagickError::InteriorNul(3))
        ));
    }

    #[test]
    fn native_source_error_releases_list() {
        let failing = FormatExports {
            create_list: failing_create_list,
            ..exports()
        };
        let source = unsafe { NativeFormatSource::<BoxedExceptionReader>::new(failing) };
        let before = LIST_DISPOSALS.load(Ordering::SeqCst);
        let err = source.formats().unwrap_err();
        assert_eq!(err.native().unwrap().severity, 410);
        assert!(LIST_DISPOSALS.load(Ordering::SeqCst) > before);
    }
}
