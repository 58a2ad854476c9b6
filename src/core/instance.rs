//! core::instance
//!
//! Instance numbering within a family.
//!
//! Consecutive installations of a family that share a section are numbered
//! `1, 2, ...`; the counter restarts whenever the section changes. An
//! installation alone in its section gets [`InstanceLabel::Sole`]. The first
//! and last installations are compared only with their single neighbor.

use super::types::{InstanceLabel, SectionLabel};

/// Assign an instance label to each installation of one family.
///
/// `sections` holds the section of every installation, in family order.
///
/// # Example
///
/// ```
/// use latticenames::core::instance::assign_instances;
/// use latticenames::core::types::{InstanceLabel, SectionLabel};
///
/// let sections: Vec<_> = ["02", "02", "03"]
///     .into_iter()
///     .map(|s| SectionLabel::new(s).unwrap())
///     .collect();
/// assert_eq!(
///     assign_instances(&sections),
///     vec![InstanceLabel::Numbered(1), InstanceLabel::Numbered(2), InstanceLabel::Sole]
/// );
/// ```
pub fn assign_instances(sections: &[SectionLabel]) -> Vec<InstanceLabel> {
    let n = sections.len();
    let mut labels = vec![InstanceLabel::Sole; n];
    if n < 2 {
        return labels;
    }

    let mut counter: u32 = 1;
    for i in 0..n {
        let same_as_next = i + 1 < n && sections[i] == sections[i + 1];
        let same_as_prev = i > 0 && sections[i] == sections[i - 1];

        if same_as_next || same_as_prev {
            labels[i] = InstanceLabel::Numbered(counter);
        }
        counter = if same_as_next { counter + 1 } else { 1 };
    }

    labels
}
