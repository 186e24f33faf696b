//! Reduce one frame's OCR candidates to a single verdict string
//!
//! A frame can hold several text blocks: the plate, partial reads, stickers,
//! dealer frames. Any allow-listed candidate wins and is never displaced by
//! a later non-matching one; without a match the last candidate is kept.

use super::AllowList;

/// Pick the verdict text for one frame.
///
/// Returns `None` when there were no candidates, in which case the previous
/// verdict should stay on display.
pub fn reconcile<'a, I>(candidates: I, allow_list: &AllowList) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut any_good = false;
    let mut last_thing: Option<&str> = None;

    for candidate in candidates {
        if allow_list.contains(candidate) {
            any_good = true;
            last_thing = Some(candidate);
        } else if !any_good {
            last_thing = Some(candidate);
        }
    }

    last_thing.map(str::to_string)
}
