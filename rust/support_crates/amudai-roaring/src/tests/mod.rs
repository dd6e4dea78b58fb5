mod bitmap_container_tests;
mod container_tests;
mod roaring_bitmap_tests;
