//! Allocation of the scratch buffers used while streaming raster blocks.
//! With the `simd` feature the buffers are aligned to a cache line.

#[cfg(feature = "simd")]
pub type AlignedVec<T> = Vec<T, allocator::CacheAligned>;
#[cfg(not(feature = "simd"))]
pub type AlignedVec<T> = Vec<T>;

pub fn new_aligned_vec<T>() -> AlignedVec<T> {
    #[cfg(feature = "simd")]
    return Vec::new_in(allocator::CacheAligned);

    #[cfg(not(feature = "simd"))]
    return Vec::new();
}

pub fn aligned_vec_with_capacity<T>(capacity: usize) -> AlignedVec<T> {
    #[cfg(feature = "simd")]
    return Vec::with_capacity_in(capacity, allocator::CacheAligned);

    #[cfg(not(feature = "simd"))]
    return Vec::with_capacity(capacity);
}

/// Create a buffer of `len` elements initialized to `val`.
pub fn aligned_vec_filled_with<T: Copy>(val: T, len: usize) -> AlignedVec<T> {
    let mut vec = aligned_vec_with_capacity(len);
    vec.resize(len, val);
    vec
}

/// Grow or shrink the buffer to exactly `len` elements, new elements are set to `val`.
/// The allocation is kept when shrinking so the buffer can be reused for the next block.
pub fn resize_aligned_vec<T: Copy>(vec: &mut AlignedVec<T>, len: usize, val: T) {
    vec.resize(len, val);
}

#[cfg(feature = "simd")]
pub mod allocator {
    use std::alloc::{AllocError, Layout};

    const CACHELINE_ALIGN: usize = 64;

    #[derive(Clone)]
    pub struct CacheAligned;

    unsafe impl std::alloc::Allocator for CacheAligned {
        fn allocate(&self, layout: Layout) -> Result<std::ptr::NonNull<[u8]>, AllocError> {
            let aligned_layout = Layout::from_size_align(layout.size(), CACHELINE_ALIGN).map_err(|_| AllocError)?;
            let ptr = unsafe { std::alloc::alloc(aligned_layout) };
            let ptr = std::ptr::NonNull::new(ptr).ok_or(AllocError)?;
            Ok(std::ptr::NonNull::slice_from_raw_parts(ptr, layout.size()))
        }

        unsafe fn deallocate(&self, ptr: std::ptr::NonNull<u8>, layout: Layout) {
            let aligned_layout = Layout::from_size_align(layout.size(), CACHELINE_ALIGN).expect("Invalid layout for cache line alignment");
            unsafe { std::alloc::dealloc(ptr.as_ptr(), aligned_layout) };
        }
    }
}
