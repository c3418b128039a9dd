use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mmioflow_raw::{Register, RegisterStorage, ValidatedLayout};

use crate::error::{MmioflowError, Result};

/// Environment variable overriding the physical memory device
pub const DEVMEM_ENV: &str = "MMIOFLOW_DEVMEM";

const DEFAULT_DEVMEM: &str = "/dev/mem";

pub fn devmem_path() -> PathBuf {
    std::env::var_os(DEVMEM_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVMEM))
}

pub fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

/// One shared mapping of a physical page
pub struct Mapping {
    base: usize,
    len: usize,
    page: u64,
}

impl Mapping {
    fn new(file: &File, page: u64, len: usize) -> Result<Self> {
        let length = NonZeroUsize::new(len)
            .ok_or_else(|| MmioflowError::MappingError("Zero-length mapping".to_string()))?;
        let offset = libc::off_t::try_from(page).map_err(|_| {
            MmioflowError::MappingError(format!("Page {page:#x} is beyond the file offset range"))
        })?;

        // SAFETY: a fresh shared mapping at a kernel-chosen address aliases no
        // Rust object; it is unmapped exactly once, in Drop.
        let base = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                Some(file),
                offset,
            )
        }?;

        tracing::debug!(
            "Mapped page 0x{:x} ({} bytes) of fd {} at {:p}",
            page,
            len,
            file.as_raw_fd(),
            base
        );

        Ok(Self {
            base: base as usize,
            len,
            page,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    /// Virtual address of `physical`, which must lie inside this mapping
    pub fn virtual_address(&self, physical: u64) -> usize {
        debug_assert!(physical >= self.page && physical - self.page < self.len as u64);
        self.base + (physical - self.page) as usize
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: `base` and `len` come from a successful mmap in `new`
        if let Err(e) = unsafe { munmap(self.base as *mut libc::c_void, self.len) } {
            tracing::warn!("Failed to unmap page 0x{:x}: {}", self.page, e);
        }
    }
}

/// A register bound to mapped memory, keeping its mapping alive
pub struct MappedRegister<'l, S: RegisterStorage> {
    register: Register<'l, S>,
    _mapping: Arc<Mapping>,
}

impl<'l, S: RegisterStorage> Deref for MappedRegister<'l, S> {
    type Target = Register<'l, S>;

    fn deref(&self) -> &Self::Target {
        &self.register
    }
}

/// Physical memory access through page mappings of a memory device
pub struct DevMem {
    path: PathBuf,
    file: RwLock<Option<Arc<File>>>,
    mappings: RwLock<HashMap<u64, Arc<Mapping>>>,
    page_size: usize,
}

impl DevMem {
    /// Create an accessor for `path`; the device is opened on first use
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: RwLock::new(None),
            mappings: RwLock::new(HashMap::new()),
            page_size: page_size(),
        }
    }

    /// Process-wide accessor for `/dev/mem` or `$MMIOFLOW_DEVMEM`
    pub fn instance() -> &'static DevMem {
        static INSTANCE: Lazy<DevMem> = Lazy::new(|| DevMem::open(devmem_path()));
        &INSTANCE
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_file(&self) -> Result<Arc<File>> {
        {
            let file = self.file.read();
            if let Some(file) = file.as_ref() {
                return Ok(Arc::clone(file));
            }
        }

        let mut file = self.file.write();
        if let Some(file) = file.as_ref() {
            return Ok(Arc::clone(file));
        }

        let opened = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.path)
            .map_err(|e| {
                MmioflowError::MappingError(format!("Failed to open {}: {}", self.path.display(), e))
            })?;
        tracing::info!("Opened {} as fd {}", self.path.display(), opened.as_raw_fd());

        let opened = Arc::new(opened);
        *file = Some(Arc::clone(&opened));
        Ok(opened)
    }

    fn get_mapping(&self, page: u64) -> Result<Arc<Mapping>> {
        {
            let mappings = self.mappings.read();
            if let Some(mapping) = mappings.get(&page) {
                return Ok(Arc::clone(mapping));
            }
        }

        let mut mappings = self.mappings.write();
        if let Some(mapping) = mappings.get(&page) {
            return Ok(Arc::clone(mapping));
        }

        let file = self.get_file()?;
        let mapping = Arc::new(Mapping::new(&file, page, self.page_size)?);
        mappings.insert(page, Arc::clone(&mapping));
        Ok(mapping)
    }

    /// Bind `layout` to the physical address `physical`
    pub fn register<'l, S: RegisterStorage>(
        &self,
        layout: &'l ValidatedLayout,
        physical: u64,
    ) -> Result<MappedRegister<'l, S>> {
        let bytes = u64::from(S::BITS / 8);
        if physical % bytes != 0 {
            return Err(MmioflowError::MisalignedAddress {
                address: physical,
                bit_width: S::BITS,
            });
        }

        let page = physical - physical % self.page_size as u64;
        let mapping = self.get_mapping(page)?;
        let address = mapping.virtual_address(physical);

        tracing::debug!(
            "Register {} at 0x{:x} mapped to {:#x}",
            layout.name(),
            physical,
            address
        );

        // SAFETY: `address` lies within a live shared mapping that the
        // returned value keeps alive, and is aligned for S (checked above,
        // mappings are page aligned).
        let register = unsafe { Register::new(layout, address) };
        Ok(MappedRegister {
            register,
            _mapping: mapping,
        })
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.read().len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A scratch file standing in for physical memory, removed on drop
    pub struct ScratchMemory {
        pub path: PathBuf,
    }

    impl ScratchMemory {
        pub fn new(pages: usize) -> Self {
            static COUNTER: AtomicUsize = AtomicUsize::new(0);
            let path = std::env::temp_dir().join(format!(
                "mmioflow-test-{}-{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(&vec![0u8; pages * super::page_size()])
                .unwrap();
            Self { path }
        }

        pub fn write(&self, offset: u64, bytes: &[u8]) {
            use std::io::{Seek, SeekFrom};
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .open(&self.path)
                .unwrap();
            file.seek(SeekFrom::Start(offset)).unwrap();
            file.write_all(bytes).unwrap();
        }

        pub fn read(&self, offset: u64, len: usize) -> Vec<u8> {
            let data = std::fs::read(&self.path).unwrap();
            data[offset as usize..offset as usize + len].to_vec()
        }
    }

    impl Drop for ScratchMemory {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ScratchMemory;
    use super::*;
    use mmioflow_raw::{BitField, BitRange, RegisterLayout, RegisterWidth};

    fn layout() -> ValidatedLayout {
        RegisterLayout::new("CTRL", RegisterWidth::W32)
            .with_field(BitField::read_write("en", [BitRange::new(0, 1).unwrap()]))
            .with_field(BitField::read_write("div", [BitRange::new(4, 8).unwrap()]))
            .validate()
            .unwrap()
    }

    #[test]
    fn test_devmem_singleton() {
        let a = DevMem::instance();
        let b = DevMem::instance();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_mapped_register_reads_and_writes_file() {
        let memory = ScratchMemory::new(2);
        memory.write(0x10, &0x0000_0021u32.to_ne_bytes());
        let devmem = DevMem::open(&memory.path);
        let layout = layout();
        let div = layout.field_id("div").unwrap();

        let ctrl = devmem.register::<u32>(&layout, 0x10).unwrap();
        assert_eq!(ctrl.read().get(div), 0x2);
        ctrl.modify_read_write(|rw| {
            rw.set(div, 0xF);
        });
        drop(ctrl);

        assert_eq!(memory.read(0x10, 4), 0x0000_00F1u32.to_ne_bytes());
    }

    #[test]
    fn test_mappings_are_cached_per_page() {
        let memory = ScratchMemory::new(2);
        let devmem = DevMem::open(&memory.path);
        let layout = layout();
        let second_page = page_size() as u64;

        let _a = devmem.register::<u32>(&layout, 0x0).unwrap();
        let _b = devmem.register::<u32>(&layout, 0x4).unwrap();
        assert_eq!(devmem.mapping_count(), 1);
        let _c = devmem.register::<u32>(&layout, second_page + 8).unwrap();
        assert_eq!(devmem.mapping_count(), 2);
    }

    #[test]
    fn test_misaligned_physical_address() {
        let memory = ScratchMemory::new(1);
        let devmem = DevMem::open(&memory.path);
        let layout = layout();
        assert!(matches!(
            devmem.register::<u32>(&layout, 0x6),
            Err(MmioflowError::MisalignedAddress { address: 0x6, bit_width: 32 })
        ));
        assert_eq!(devmem.mapping_count(), 0);
    }

    #[test]
    fn test_missing_device() {
        let devmem = DevMem::open("/nonexistent/mmioflow-devmem");
        let layout = layout();
        assert!(matches!(
            devmem.register::<u32>(&layout, 0x0),
            Err(MmioflowError::MappingError(_))
        ));
    }
}
