// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector4f };

use std::ops;
use std::vec::Vec;

// Premultiplied RGBA framebuffer, row-major from the top-left pixel.
#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Vec<Vector4f>,
    height: usize,
    width: usize
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = Vector4f;

    fn index(&self, index: (usize, usize)) -> &Vector4f {
        let transformed_index = index.0 + self.width * index.1;
        assert!(transformed_index < self.height * self.width);
        &self.data[transformed_index]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Vector4f {
        let transformed_index = index.0 + self.width * index.1;
        assert!(transformed_index < self.height * self.width);
        &mut self.data[transformed_index]
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_number = width * height;
        Self { data: vec!(Vector4f::new(0.0, 0.0, 0.0, 0.0);
                          pixel_number),
               width: width,
               height: height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn raw_copy(&self) -> Vec<(Float, Float, Float, Float)> {
        self.data.iter().map(|p| (p.x, p.y, p.z, p.w)).collect()
    }
}

/* Test for Bitmap */
