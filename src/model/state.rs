//! Channel occupancy states

use std::fmt;

/// One occupancy configuration of the channel: an ordered sequence of binding
/// sites, each empty or holding one solute (by index into the model's solute
/// list).
///
/// States are created during enumeration and immutable afterwards; identity
/// is structural equality of the slot sequence. The discovery-ordered state
/// list is the basis for transition-matrix row/column indices.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ChannelState {
    sites: Vec<Option<usize>>,
}

impl ChannelState {
    /// The all-empty state that seeds enumeration.
    pub fn empty(num_sites: usize) -> Self {
        ChannelState {
            sites: vec![None; num_sites],
        }
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Occupant of a site, 0-based.
    pub fn site(&self, index: usize) -> Option<usize> {
        self.sites[index]
    }

    /// Copy of this state with one site replaced.
    pub(crate) fn with_site(&self, index: usize, occupant: Option<usize>) -> Self {
        let mut sites = self.sites.clone();
        sites[index] = occupant;
        ChannelState { sites }
    }

    /// Occupied sites as (0-based site index, solute index) pairs.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sites
            .iter()
            .enumerate()
            .filter_map(|(site, occ)| occ.map(|ion| (site, ion)))
    }

    pub fn occupancy_count(&self) -> usize {
        self.sites.iter().filter(|occ| occ.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.iter().all(|occ| occ.is_none())
    }

    /// Render with solute names, e.g. `[Na, 0, Ca]`.
    pub fn label(&self, solutes: &[String]) -> String {
        let slots: Vec<&str> = self
            .sites
            .iter()
            .map(|occ| match occ {
                Some(ion) => solutes[*ion].as_str(),
                None => "0",
            })
            .collect();
        format!("[{}]", slots.join(", "))
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<String> = self
            .sites
            .iter()
            .map(|occ| match occ {
                Some(ion) => format!("{}", ion + 1),
                None => "0".to_string(),
            })
            .collect();
        write!(f, "[{}]", slots.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_identity() {
        let a = ChannelState::empty(3).with_site(1, Some(0));
        let b = ChannelState::empty(3).with_site(1, Some(0));
        let c = ChannelState::empty(3).with_site(1, Some(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn occupied_iterates_in_site_order() {
        let s = ChannelState::empty(4)
            .with_site(3, Some(1))
            .with_site(0, Some(0));
        let occ: Vec<(usize, usize)> = s.occupied().collect();
        assert_eq!(occ, vec![(0, 0), (3, 1)]);
        assert_eq!(s.occupancy_count(), 2);
        assert!(!s.is_empty());
    }

    #[test]
    fn labels_use_solute_names() {
        let solutes = vec!["Na".to_string(), "Ca".to_string()];
        let s = ChannelState::empty(2).with_site(0, Some(1));
        assert_eq!(s.label(&solutes), "[Ca, 0]");
    }
}
