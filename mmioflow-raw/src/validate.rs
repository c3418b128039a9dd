//! Bounds and overlap validation of register layouts
//!
//! Every check runs to completion so one call reports every problem in a
//! layout. Overlap detection is two-phase: a sort plus linear sweep answers
//! "is there any overlap at all", and only then does the detailed pass build
//! per-range notes. The detailed pass keeps a candidate start index that only
//! moves forward, so ranges entirely below the current target are never
//! revisited.

use std::collections::HashMap;

use crate::bit_range::BitRange;
use crate::diagnostic::{
    list, plural, quoted_list, Diagnostic, DiagnosticKind, Location, Note, ValidationError,
};
use crate::field::BitField;
use crate::layout::RegisterLayout;

/// Validate `layout`, collecting every diagnostic before failing
pub fn validate_layout(layout: &RegisterLayout) -> Result<(), ValidationError> {
    let mut diagnostics = Vec::new();
    let bit_width = layout.width().bits();

    for field in layout.fields() {
        let location = Location::Field {
            register: layout.name().to_owned(),
            field: field.name().to_owned(),
        };
        check_field(field, bit_width, &location, &mut diagnostics);
    }

    check_duplicate_names(layout, &mut diagnostics);
    check_register_overlap(layout, &mut diagnostics);

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            register: layout.name().to_owned(),
            diagnostics,
        })
    }
}

fn check_field(
    field: &BitField,
    bit_width: u32,
    location: &Location,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if field.ranges().is_empty() {
        diagnostics.push(Diagnostic::new(
            location.clone(),
            DiagnosticKind::EmptyField,
            format!("field '{}' has no bit ranges", field.name()),
        ));
        return;
    }

    let empty: Vec<BitRange> = field
        .ranges()
        .iter()
        .copied()
        .filter(BitRange::is_empty)
        .collect();
    if !empty.is_empty() {
        let notes = empty
            .iter()
            .map(|range| Note::new(Some(*range), format!("bit range '{range}' has zero width")))
            .collect();
        diagnostics.push(
            Diagnostic::new(
                location.clone(),
                DiagnosticKind::ZeroWidthBitRange,
                format!(
                    "zero-width bit range{} in '{}'",
                    plural(empty.len()),
                    field.name()
                ),
            )
            .with_notes(notes),
        );
    }

    let outside: Vec<BitRange> = field
        .ranges()
        .iter()
        .copied()
        .filter(|range| !range.is_empty() && !range.contains_within(bit_width))
        .collect();
    if !outside.is_empty() {
        let notes = outside
            .iter()
            .map(|range| {
                Note::new(
                    Some(*range),
                    format!(
                        "bit range '{range}' extends outside register bit range '0..{bit_width}'"
                    ),
                )
            })
            .collect();
        let (noun, verb) = if outside.len() == 1 {
            ("bit range", "extends")
        } else {
            ("bit ranges", "extend")
        };
        diagnostics.push(
            Diagnostic::new(
                location.clone(),
                DiagnosticKind::OutOfBounds,
                format!(
                    "{noun} in '{}' {verb} outside register bounds",
                    field.name()
                ),
            )
            .with_notes(notes),
        );
    }

    if field.is_discontiguous() {
        check_field_overlap(field, location, diagnostics);
    }
}

fn check_field_overlap(field: &BitField, location: &Location, diagnostics: &mut Vec<Diagnostic>) {
    let ranges: Vec<BitRange> = field
        .ranges()
        .iter()
        .copied()
        .filter(|range| !range.is_empty())
        .collect();

    let mut notes = Vec::new();
    locate_overlapping_ranges(
        ranges,
        |range| *range,
        |_, _| false,
        |target, overlapping, subranges| {
            let mut message = format!(
                "bit range '{target}' overlaps bit range{} {}",
                plural(overlapping.len()),
                quoted_list(&overlapping)
            );
            if !(subranges.len() == 1 && subranges[0] == target) {
                message.push_str(&format!(
                    " over subrange{} {}",
                    plural(subranges.len()),
                    quoted_list(&subranges)
                ));
            }
            notes.push(Note::new(Some(target), message).with_subranges(subranges));
        },
    );

    if !notes.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                location.clone(),
                DiagnosticKind::OverlappingBitRanges,
                format!("overlapping bit ranges in '{}'", field.name()),
            )
            .with_notes(notes),
        );
    }
}

fn check_duplicate_names(layout: &RegisterLayout, diagnostics: &mut Vec<Diagnostic>) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut reported: Vec<&str> = Vec::new();

    for (index, field) in layout.fields().iter().enumerate() {
        match first_seen.get(field.name()) {
            None => {
                first_seen.insert(field.name(), index);
            }
            Some(first) if !reported.contains(&field.name()) => {
                reported.push(field.name());
                diagnostics.push(
                    Diagnostic::new(
                        Location::Register(layout.name().to_owned()),
                        DiagnosticKind::DuplicateFieldName,
                        format!(
                            "duplicate field name '{}' in '{}'",
                            field.name(),
                            layout.name()
                        ),
                    )
                    .with_notes(vec![Note::new(
                        None,
                        format!("'{}' is first declared as field {}", field.name(), first),
                    )]),
                );
            }
            Some(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OwnedRange<'a> {
    range: BitRange,
    field: usize,
    name: &'a str,
}

fn check_register_overlap(layout: &RegisterLayout, diagnostics: &mut Vec<Diagnostic>) {
    let refs: Vec<OwnedRange<'_>> = layout
        .fields()
        .iter()
        .enumerate()
        .flat_map(|(field, def)| {
            def.ranges().iter().map(move |range| OwnedRange {
                range: *range,
                field,
                name: def.name(),
            })
        })
        // Empty ranges were already reported per field. Out-of-bounds ranges
        // stay in so overlaps inside the register are still found.
        .filter(|owned| !owned.range.is_empty())
        .collect();

    let mut notes = Vec::new();
    locate_overlapping_ranges(
        refs,
        |owned| owned.range,
        |a, b| a.field == b.field,
        |target, overlapping, subranges| {
            // Group the overlapping ranges by owning field, first-seen order.
            let mut groups: Vec<(&str, Vec<BitRange>)> = Vec::new();
            for owned in &overlapping {
                match groups.iter_mut().find(|(name, _)| *name == owned.name) {
                    Some((_, ranges)) => ranges.push(owned.range),
                    None => groups.push((owned.name, vec![owned.range])),
                }
            }
            let grouped = list(
                groups
                    .iter()
                    .map(|(name, ranges)| format!("{} in '{}'", quoted_list(ranges), name))
                    .collect(),
            );
            let message = format!(
                "bit range '{}' in '{}' overlaps bit range{} {} over subrange{} {}",
                target.range,
                target.name,
                plural(overlapping.len()),
                grouped,
                plural(subranges.len()),
                quoted_list(&subranges)
            );
            notes.push(Note::new(Some(target.range), message).with_subranges(subranges));
        },
    );

    if !notes.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                Location::Register(layout.name().to_owned()),
                DiagnosticKind::OverlappingBitRanges,
                format!("overlapping bit ranges in '{}'", layout.name()),
            )
            .with_notes(notes),
        );
    }
}

/// Linear sweep over ranges sorted by lower bound
pub(crate) fn has_overlapping_ranges(sorted: impl IntoIterator<Item = BitRange>) -> bool {
    let mut previous_upper: Option<u32> = None;
    for range in sorted {
        if let Some(upper) = previous_upper {
            if range.lower() < upper {
                return true;
            }
        }
        previous_upper = Some(previous_upper.map_or(range.upper(), |u| u.max(range.upper())));
    }
    false
}

/// Report every overlap among `refs`
///
/// `on_overlap` is called once per target that overlaps something, with the
/// overlapping items in sorted order and the overlapping sub-ranges of the
/// target merged into continuous runs. Pairs for which `skip` holds are never
/// considered overlapping. Items must have non-empty ranges.
pub(crate) fn locate_overlapping_ranges<T: Copy>(
    mut refs: Vec<T>,
    range_of: impl Fn(&T) -> BitRange,
    skip: impl Fn(&T, &T) -> bool,
    mut on_overlap: impl FnMut(T, Vec<T>, Vec<BitRange>),
) {
    refs.sort_by_key(|item| range_of(item));
    if !has_overlapping_ranges(refs.iter().map(&range_of)) {
        return;
    }

    let mut start = 0;
    for (index, target_ref) in refs.iter().enumerate() {
        let target = range_of(target_ref);
        while start < refs.len() && range_of(&refs[start]).upper() <= target.lower() {
            start += 1;
        }

        let mut overlapping = Vec::new();
        let mut subranges: Vec<BitRange> = Vec::new();
        for (candidate_index, candidate_ref) in refs.iter().enumerate().skip(start) {
            if candidate_index == index {
                continue;
            }
            let candidate = range_of(candidate_ref);
            if candidate.lower() >= target.upper() {
                break;
            }
            if skip(target_ref, candidate_ref) {
                continue;
            }
            let Some(overlap) = target.overlap(&candidate) else {
                continue;
            };

            match subranges.last_mut() {
                Some(last) if overlap.lower() <= last.upper() => {
                    let upper = last.upper().max(overlap.upper());
                    *last = BitRange::new(last.lower(), upper).unwrap_or(*last);
                }
                _ => subranges.push(overlap),
            }
            overlapping.push(*candidate_ref);
        }

        if !overlapping.is_empty() {
            on_overlap(*target_ref, overlapping, subranges);
        }
    }
}
