//! State-space enumeration and symbolic transition structure
//!
//! Breadth-first exploration from the all-empty state. Each popped state is
//! probed for the three elementary move families, in a fixed order that also
//! fixes the discovered state order (and with it the matrix row/column
//! indices):
//!
//! 1. entry of each solute into site 1 from the extracellular reservoir,
//! 2. internal hops toward the intracellular side, left to right,
//! 3. exit from the last site to the intracellular reservoir.
//!
//! Every undirected edge produces two directed [`TransitionTerm`]s (the
//! forward move and its reverse) plus one entry in each transport table.
//! Multiple microscopic paths into the same matrix cell simply accumulate as
//! separate terms.

use std::collections::{HashMap, VecDeque};

use super::interaction::{CoeffFactor, CoefficientLayout};
use super::rates::{Direction, RateId};
use super::state::ChannelState;

/// One directed microscopic move contributing to the transition matrix:
/// column `from`, row `to`, weighted by rate `rate` times the interaction
/// factors.
#[derive(Clone, Debug)]
pub(crate) struct TransitionTerm {
    pub from: usize,
    pub to: usize,
    pub rate: RateId,
    pub coeffs: Vec<CoeffFactor>,
}

/// One contribution to the flux of a solute over a barrier: the rate (with
/// its interaction factors) leaving `state`.
#[derive(Clone, Debug)]
pub(crate) struct FluxTerm {
    pub rate: RateId,
    pub coeffs: Vec<CoeffFactor>,
    pub state: usize,
}

/// Flux contributions bucketed by `[barrier][ion]`, one table per direction.
#[derive(Clone, Debug)]
pub(crate) struct TransportTable {
    buckets: Vec<Vec<Vec<FluxTerm>>>,
}

impl TransportTable {
    fn new(num_barriers: usize, n_ions: usize) -> Self {
        TransportTable {
            buckets: vec![vec![Vec::new(); n_ions]; num_barriers],
        }
    }

    fn push(&mut self, barrier: usize, ion: usize, term: FluxTerm) {
        self.buckets[barrier][ion].push(term);
    }

    pub fn terms(&self, barrier: usize, ion: usize) -> &[FluxTerm] {
        &self.buckets[barrier][ion]
    }
}

/// The enumerated topology: states in discovery order, directed transition
/// terms, and the two transport tables (inward and outward).
#[derive(Clone, Debug)]
pub(crate) struct StateSpace {
    pub states: Vec<ChannelState>,
    pub transitions: Vec<TransitionTerm>,
    pub inward: TransportTable,
    pub outward: TransportTable,
}

impl StateSpace {
    pub fn num_states(&self) -> usize {
        self.states.len()
    }
}

/// Enumerate all occupancy states reachable from the empty channel and build
/// the symbolic transition structure.
///
/// Termination is guaranteed: the state space is bounded by
/// `(n_ions + 1)^num_sites` and each state enters the worklist once.
pub(crate) fn enumerate(
    num_sites: usize,
    n_ions: usize,
    charges: &[i32],
    layout: &CoefficientLayout,
) -> StateSpace {
    let mut states: Vec<ChannelState> = vec![ChannelState::empty(num_sites)];
    let mut index: HashMap<ChannelState, usize> = HashMap::new();
    index.insert(states[0].clone(), 0);

    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(0);

    let mut space = StateSpace {
        states: Vec::new(),
        transitions: Vec::new(),
        inward: TransportTable::new(num_sites + 1, n_ions),
        outward: TransportTable::new(num_sites + 1, n_ions),
    };

    while let Some(si) = queue.pop_front() {
        let config = states[si].clone();

        // entry from the extracellular reservoir into site 1
        if config.site(0).is_none() {
            for ion in 0..n_ions {
                let target = config.with_site(0, Some(ion));
                let ti = intern(&mut states, &mut index, &mut queue, target);
                connect(&mut space, &states, charges, layout, si, ti, ion, 0, 1);
            }
        }

        // internal hops toward the intracellular side
        for site in 0..num_sites.saturating_sub(1) {
            if let (Some(ion), None) = (config.site(site), config.site(site + 1)) {
                let target = config.with_site(site, None).with_site(site + 1, Some(ion));
                let ti = intern(&mut states, &mut index, &mut queue, target);
                connect(
                    &mut space,
                    &states,
                    charges,
                    layout,
                    si,
                    ti,
                    ion,
                    site + 1,
                    site + 2,
                );
            }
        }

        // exit from the last site to the intracellular reservoir
        if let Some(ion) = config.site(num_sites - 1) {
            let target = config.with_site(num_sites - 1, None);
            let ti = intern(&mut states, &mut index, &mut queue, target);
            connect(
                &mut space,
                &states,
                charges,
                layout,
                si,
                ti,
                ion,
                num_sites,
                num_sites + 1,
            );
        }
    }

    space.states = states;
    space
}

fn intern(
    states: &mut Vec<ChannelState>,
    index: &mut HashMap<ChannelState, usize>,
    queue: &mut VecDeque<usize>,
    state: ChannelState,
) -> usize {
    if let Some(&i) = index.get(&state) {
        return i;
    }
    let i = states.len();
    index.insert(state.clone(), i);
    states.push(state);
    queue.push_back(i);
    i
}

/// Record both directed terms of one edge: the inward move `src -> dst` out
/// of state `si` and the outward move `dst -> src` out of state `ti`.
/// `src`/`dst` are site coordinates (0 = extracellular, `n + 1` =
/// intracellular); the crossed barrier is `src` for the inward direction.
#[allow(clippy::too_many_arguments)]
fn connect(
    space: &mut StateSpace,
    states: &[ChannelState],
    charges: &[i32],
    layout: &CoefficientLayout,
    si: usize,
    ti: usize,
    ion: usize,
    src: usize,
    dst: usize,
) {
    let barrier = src; // 0-based barrier index crossed by this edge

    let inward_id = RateId {
        barrier,
        ion,
        direction: Direction::Inward,
    };
    let inward_coeffs = layout.factors(&states[si], charges, ion, src, dst);
    space.transitions.push(TransitionTerm {
        from: si,
        to: ti,
        rate: inward_id,
        coeffs: inward_coeffs.clone(),
    });
    space.inward.push(
        barrier,
        ion,
        FluxTerm {
            rate: inward_id,
            coeffs: inward_coeffs,
            state: si,
        },
    );

    let outward_id = RateId {
        barrier,
        ion,
        direction: Direction::Outward,
    };
    let outward_coeffs = layout.factors(&states[ti], charges, ion, dst, src);
    space.transitions.push(TransitionTerm {
        from: ti,
        to: si,
        rate: outward_id,
        coeffs: outward_coeffs.clone(),
    });
    space.outward.push(
        barrier,
        ion,
        FluxTerm {
            rate: outward_id,
            coeffs: outward_coeffs,
            state: ti,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InteractionMode;

    fn space(num_sites: usize, n_ions: usize) -> StateSpace {
        let charges = vec![1; n_ions];
        let layout = CoefficientLayout::new(InteractionMode::None, num_sites);
        enumerate(num_sites, n_ions, &charges, &layout)
    }

    #[test]
    fn full_cartesian_space_is_reachable() {
        for (n, k) in [(1, 1), (1, 3), (2, 2), (3, 2), (4, 1)] {
            let s = space(n, k);
            assert_eq!(s.num_states(), (k + 1).pow(n as u32), "n={n} k={k}");
        }
    }

    #[test]
    fn single_site_edge_set() {
        let s = space(1, 1);
        assert_eq!(s.num_states(), 2);
        // two edges (entry and exit), each with two directed terms
        assert_eq!(s.transitions.len(), 4);
        // every barrier bucket holds exactly one term per direction
        assert_eq!(s.inward.terms(0, 0).len(), 1);
        assert_eq!(s.inward.terms(1, 0).len(), 1);
        assert_eq!(s.outward.terms(0, 0).len(), 1);
        assert_eq!(s.outward.terms(1, 0).len(), 1);
    }

    #[test]
    fn directed_terms_never_touch_the_diagonal() {
        let s = space(3, 2);
        assert!(s.transitions.iter().all(|t| t.from != t.to));
    }

    #[test]
    fn inward_terms_leave_the_recorded_state() {
        let s = space(2, 2);
        for barrier in 0..3 {
            for ion in 0..2 {
                for term in s.inward.terms(barrier, ion) {
                    assert_eq!(term.rate.barrier, barrier);
                    assert_eq!(term.rate.ion, ion);
                    assert_eq!(term.rate.direction, Direction::Inward);
                    // the recorded source state must exist
                    assert!(term.state < s.num_states());
                }
            }
        }
    }
}
