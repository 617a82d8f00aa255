//! Content-model particles
//!
//! A particle is one entry of a complex type's content model: a single
//! element, an ordered sequence, or an exclusive choice, each with its own
//! occurrence bounds. The generator and the differ both pattern-match over
//! this one variant set, so traversal logic stays centralized.

use super::occurs::Occurs;
use super::ElementNode;

/// A content-model entry
#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    /// A single element declaration
    Element(ElementNode),
    /// An ordered sequence of particles
    Sequence {
        /// Occurrence bounds of the sequence as a whole
        occurs: Occurs,
        /// The contained particles, in declaration order
        particles: Vec<Particle>,
    },
    /// An exclusive choice between particles
    Choice {
        /// Occurrence bounds of the choice as a whole
        occurs: Occurs,
        /// The branches; exactly one is emitted per occurrence
        particles: Vec<Particle>,
    },
}

impl Particle {
    /// The occurrence bounds of this particle
    pub fn occurs(&self) -> Occurs {
        match self {
            Particle::Element(e) => e.occurs,
            Particle::Sequence { occurs, .. } => *occurs,
            Particle::Choice { occurs, .. } => *occurs,
        }
    }

    /// Whether a conforming document may omit this particle entirely
    pub fn is_emptiable(&self) -> bool {
        match self {
            Particle::Element(e) => e.occurs.is_emptiable(),
            Particle::Sequence { occurs, particles } => {
                occurs.is_emptiable() || particles.iter().all(|p| p.is_emptiable())
            }
            Particle::Choice { occurs, particles } => {
                occurs.is_emptiable() || particles.iter().any(|p| p.is_emptiable())
            }
        }
    }

    /// Visit every element declaration reachable from this particle
    pub fn for_each_element<'a>(&'a self, f: &mut impl FnMut(&'a ElementNode)) {
        match self {
            Particle::Element(e) => f(e),
            Particle::Sequence { particles, .. } | Particle::Choice { particles, .. } => {
                for p in particles {
                    p.for_each_element(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRef;

    fn elem(name: &str, occurs: Occurs) -> Particle {
        Particle::Element(ElementNode {
            name: name.to_string(),
            type_ref: TypeRef::Builtin(crate::model::BuiltinType::String),
            occurs,
            nillable: false,
            fixed: None,
            default: None,
        })
    }

    #[test]
    fn test_sequence_emptiable_only_if_all_children_are() {
        let seq = Particle::Sequence {
            occurs: Occurs::once(),
            particles: vec![elem("A", Occurs::optional()), elem("B", Occurs::once())],
        };
        assert!(!seq.is_emptiable());

        let seq = Particle::Sequence {
            occurs: Occurs::once(),
            particles: vec![elem("A", Occurs::optional())],
        };
        assert!(seq.is_emptiable());
    }

    #[test]
    fn test_choice_emptiable_if_any_branch_is() {
        let choice = Particle::Choice {
            occurs: Occurs::once(),
            particles: vec![elem("A", Occurs::once()), elem("B", Occurs::optional())],
        };
        assert!(choice.is_emptiable());
    }

    #[test]
    fn test_for_each_element_visits_nested() {
        let particle = Particle::Sequence {
            occurs: Occurs::once(),
            particles: vec![
                elem("A", Occurs::once()),
                Particle::Choice {
                    occurs: Occurs::once(),
                    particles: vec![elem("B", Occurs::once()), elem("C", Occurs::once())],
                },
            ],
        };
        let mut names = Vec::new();
        particle.for_each_element(&mut |e| names.push(e.name.clone()));
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
