use super::*;

/// Returns `(unpadded, padded)` bytes per row; buffer copies need rows
/// aligned to `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub(super) fn compute_padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
    (unpadded_bytes_per_row, padded_bytes_per_row)
}

pub(super) fn copy_padded_readback_rows(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    let output_size = (unpadded_bytes_per_row * height) as usize;
    output.resize(output_size, 0);

    if padded_bytes_per_row == unpadded_bytes_per_row {
        output.copy_from_slice(&data[..output_size]);
        return;
    }

    for row in 0..height {
        let padded_offset = (row * padded_bytes_per_row) as usize;
        let unpadded_offset = (row * unpadded_bytes_per_row) as usize;
        let row_data = &data[padded_offset..padded_offset + unpadded_bytes_per_row as usize];
        output[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize]
            .copy_from_slice(row_data);
    }
}

pub(super) fn create_readback_buffer(
    device: &wgpu::Device,
    label: Option<&str>,
    size: u64,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label,
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(super) fn encode_copy_texture_to_buffer(
    encoder: &mut wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    buffer: &wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
) {
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Maps `buffer`, blocks until the GPU is done, and copies its contents into
/// `mapped_bytes`.
pub(super) fn map_readback_buffer_into(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    mapped_bytes: &mut Vec<u8>,
) -> Result<(), FilterError> {
    mapped_bytes.clear();

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            tracing::warn!("Failed to send map_async result from callback");
        }
    });

    if let Err(error) = device.poll(wgpu::PollType::Wait) {
        return Err(FilterError::Readback(format!("{error:?}")));
    }

    let map_result = receiver
        .recv()
        .map_err(|error| FilterError::Readback(error.to_string()))?;
    map_result.map_err(|error| FilterError::Readback(format!("{error:?}")))?;

    {
        let mapped_range = buffer_slice.get_mapped_range();
        mapped_bytes.extend_from_slice(&mapped_range);
    }
    buffer.unmap();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(compute_padded_bytes_per_row(64, 4), (256, 256));
        assert_eq!(compute_padded_bytes_per_row(65, 4), (260, 512));
        assert_eq!(compute_padded_bytes_per_row(1, 4), (4, 256));
    }

    #[test]
    fn padding_is_stripped_from_each_row() {
        let padded = [1, 2, 0, 0, 3, 4, 0, 0];
        let mut output = Vec::new();
        copy_padded_readback_rows(&padded, 2, 2, 4, &mut output);
        assert_eq!(output, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unpadded_rows_are_copied_verbatim() {
        let data = [9, 8, 7, 6];
        let mut output = vec![0; 10];
        copy_padded_readback_rows(&data, 1, 4, 4, &mut output);
        assert_eq!(output, vec![9, 8, 7, 6]);
    }
}
