//! Escrita direta de pixels XRGB8888 num buffer travado.
//! O pitch vem do backend e pode ser maior que `width * 4`; os bytes de
//! preenchimento no fim de cada linha nunca são tocados.

use crate::video::{BackendError, BackendResult, Rect};

const BYTES_PER_PIXEL: usize = 4;

/// Visão mutável de um quadro de 32 bits por pixel
pub struct FrameBuffer<'a> {
    pixels: &'a mut [u8],
    width: usize,
    height: usize,
    pitch: usize,
}

impl<'a> FrameBuffer<'a> {
    pub fn new(pixels: &'a mut [u8], width: usize, height: usize, pitch: usize) -> BackendResult<Self> {
        if pitch % BYTES_PER_PIXEL != 0 || pitch < width * BYTES_PER_PIXEL {
            return Err(BackendError::Misaligned { pitch });
        }
        let needed = if height == 0 { 0 } else { pitch * (height - 1) + width * BYTES_PER_PIXEL };
        if pixels.len() < needed {
            return Err(BackendError::OutOfBounds { len: pixels.len(), width, height, pitch });
        }
        Ok(Self { pixels, width, height, pitch })
    }

    /// Linha `y` como palavras de 32 bits (somente os `width` pixels visíveis)
    fn row_mut(&mut self, y: usize) -> BackendResult<&mut [u32]> {
        let pitch = self.pitch;
        let start = y * pitch;
        let row = &mut self.pixels[start..start + self.width * BYTES_PER_PIXEL];
        bytemuck::try_cast_slice_mut(row).map_err(|_| BackendError::Misaligned { pitch })
    }

    /// Preenche o quadro inteiro com uma cor 0xAARRGGBB
    pub fn fill(&mut self, argb: u32) -> BackendResult<()> {
        for y in 0..self.height {
            self.row_mut(y)?.fill(argb);
        }
        Ok(())
    }

    /// Preenche um retângulo (recortado aos limites do quadro)
    pub fn fill_rect(&mut self, rect: Rect, argb: u32) -> BackendResult<()> {
        let rect = rect.clip(self.width, self.height);
        for y in rect.y..rect.y + rect.h {
            self.row_mut(y)?[rect.x..rect.x + rect.w].fill(argb);
        }
        Ok(())
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y * self.pitch + x * BYTES_PER_PIXEL;
        let bytes = &self.pixels[offset..offset + BYTES_PER_PIXEL];
        Some(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Lê um pixel de um buffer somente leitura (usado para inspecionar o quadro entregue)
pub fn read_pixel(pixels: &[u8], pitch: usize, x: usize, y: usize) -> Option<u32> {
    let offset = y.checked_mul(pitch)?.checked_add(x.checked_mul(BYTES_PER_PIXEL)?)?;
    let bytes = pixels.get(offset..offset + BYTES_PER_PIXEL)?;
    Some(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
