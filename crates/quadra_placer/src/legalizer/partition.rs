//! Recursive bipartition of a legalizer area.
//!
//! Splits an area's rectangle along alternating axes, dividing the blocks in
//! linear-coordinate order proportionally to the split, until every block
//! lands on a single lattice tile. Each recursion step shrinks a rectangle
//! dimension by at least one lattice step or empties the block set, so the
//! recursion is finite.

use crate::error::{PlaceResult, PlacerError};
use quadra_device::{BlockCategory, BlockType, BlockTypeId, Device};

/// The axis a recursion level splits along.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Axis {
    X,
    Y,
}

/// An inclusive lattice-aligned rectangle on the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Rect {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) right: i32,
    pub(crate) bottom: i32,
}

/// Assigns legal coordinates in `tmp_x`/`tmp_y` to every block in `blocks`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn legalize_area(
    device: &Device,
    block_type: &BlockType,
    ty: BlockTypeId,
    linear_x: &[f64],
    linear_y: &[f64],
    tmp_x: &mut [i32],
    tmp_y: &mut [i32],
    rect: Rect,
    mut blocks: Vec<usize>,
    axis: Axis,
) -> PlaceResult<()> {
    let repeat = block_type.repeat as i32;
    let height = block_type.height as i32;

    // Single tile: everything lands on it.
    if rect.right - rect.left < repeat && rect.bottom - rect.top < height {
        for &block in &blocks {
            tmp_x[block] = rect.left;
            tmp_y[block] = rect.top;
        }
        return Ok(());
    }

    if blocks.is_empty() {
        return Ok(());
    }

    // A single block goes to the nearest matching site in the rectangle.
    if blocks.len() == 1 {
        let block = blocks[0];
        let mut best = None;
        let mut best_distance = f64::MAX;
        let mut x = rect.left;
        while x <= rect.right {
            if device.column_type(x as u32) == ty {
                let mut y = rect.top;
                while y <= rect.bottom {
                    let dx = linear_x[block] - x as f64;
                    let dy = linear_y[block] - y as f64;
                    let distance = dx * dx + dy * dy;
                    if distance < best_distance {
                        best_distance = distance;
                        best = Some((x, y));
                    }
                    y += height;
                }
            }
            x += repeat;
        }
        let (x, y) = best.ok_or_else(|| {
            PlacerError::Integrity(format!(
                "no site of type '{}' in columns {}..={}",
                block_type.name, rect.left, rect.right
            ))
        })?;
        tmp_x[block] = x;
        tmp_y[block] = y;
        return Ok(());
    }

    // Too narrow for the requested axis: split the other one.
    if axis == Axis::X && rect.right - rect.left < repeat {
        return legalize_area(
            device, block_type, ty, linear_x, linear_y, tmp_x, tmp_y, rect, blocks, Axis::Y,
        );
    }
    if axis == Axis::Y && rect.bottom - rect.top < height {
        return legalize_area(
            device, block_type, ty, linear_x, linear_y, tmp_x, tmp_y, rect, blocks, Axis::X,
        );
    }

    let mut first = rect;
    let mut second = rect;
    let split_ratio;
    let next_axis;

    match axis {
        Axis::X => {
            if block_type.category == BlockCategory::Clb {
                // Split at the median matching column; hard-block columns
                // inside the rectangle do not count.
                let mut num_columns = 0;
                for x in rect.left..=rect.right {
                    if device.column_type(x as u32) == ty {
                        num_columns += 1;
                    }
                }
                if num_columns == 0 {
                    return Err(PlacerError::Integrity(format!(
                        "no column of type '{}' in columns {}..={}",
                        block_type.name, rect.left, rect.right
                    )));
                }
                let half = (num_columns + 1) / 2;
                let mut counted = 0;
                let mut split_column = rect.left;
                for x in rect.left..=rect.right {
                    if device.column_type(x as u32) == ty {
                        counted += 1;
                    }
                    if counted >= half {
                        split_column = x;
                        break;
                    }
                }
                split_ratio = half as f64 / num_columns as f64;
                first.right = split_column;
                second.left = split_column + 1;
            } else {
                let num_columns = (rect.right - rect.left) / repeat + 1;
                split_ratio = (num_columns / 2) as f64 / num_columns as f64;
                first.right = rect.left + (num_columns / 2 - 1) * repeat;
                second.left = rect.left + (num_columns / 2) * repeat;
            }
            blocks.sort_by(|&a, &b| linear_x[a].total_cmp(&linear_x[b]));
            next_axis = Axis::Y;
        }
        Axis::Y => {
            if repeat == 1 {
                let split_row = (rect.top + rect.bottom) / 2;
                split_ratio =
                    (split_row - rect.top + 1) as f64 / (rect.bottom - rect.top + 1) as f64;
                first.bottom = split_row;
                second.top = split_row + 1;
            } else {
                let num_rows = (rect.bottom - rect.top) / height + 1;
                split_ratio = (num_rows / 2) as f64 / num_rows as f64;
                first.bottom = rect.top + (num_rows / 2 - 1) * height;
                second.top = rect.top + (num_rows / 2) * height;
            }
            blocks.sort_by(|&a, &b| linear_y[a].total_cmp(&linear_y[b]));
            next_axis = Axis::X;
        }
    }

    let split = (split_ratio * blocks.len() as f64).ceil() as usize;
    let split = split.min(blocks.len());
    let second_blocks = blocks.split_off(split);

    legalize_area(
        device, block_type, ty, linear_x, linear_y, tmp_x, tmp_y, first, blocks, next_axis,
    )?;
    legalize_area(
        device, block_type, ty, linear_x, linear_y, tmp_x, tmp_y, second, second_blocks, next_axis,
    )
}
