//! Step state machine for the four-page submission wizard.
//!
//! Steps form an ordered table where each entry carries an applicability
//! predicate over the draft. Forward and backward moves skip inapplicable
//! entries generically, so `Academic` disappears from the path in both
//! directions whenever the document type is not academic.

use std::fmt;

use pubflow_domain::SubmissionDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Info = 1,
    Academic = 2,
    Document = 3,
    Payment = 4,
}

impl Step {
    pub const FIRST: Step = Step::Info;
    pub const LAST: Step = Step::Payment;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        STEP_TABLE
            .iter()
            .map(|definition| definition.step)
            .find(|step| step.number() == number)
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Info => "Information",
            Step::Academic => "Academic details",
            Step::Document => "Document",
            Step::Payment => "Payment",
        }
    }

    pub fn is_applicable(self, draft: &SubmissionDraft) -> bool {
        STEP_TABLE
            .iter()
            .find(|definition| definition.step == self)
            .map(|definition| (definition.applies)(draft))
            .unwrap_or(false)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.number())
    }
}

struct StepDefinition {
    step: Step,
    applies: fn(&SubmissionDraft) -> bool,
}

fn always(_: &SubmissionDraft) -> bool {
    true
}

fn academic_only(draft: &SubmissionDraft) -> bool {
    draft.is_academic()
}

const STEP_TABLE: [StepDefinition; 4] = [
    StepDefinition {
        step: Step::Info,
        applies: always,
    },
    StepDefinition {
        step: Step::Academic,
        applies: academic_only,
    },
    StepDefinition {
        step: Step::Document,
        applies: always,
    },
    StepDefinition {
        step: Step::Payment,
        applies: always,
    },
];

/// Steps that apply to `draft`, in wizard order.
pub fn applicable_steps(draft: &SubmissionDraft) -> Vec<Step> {
    STEP_TABLE
        .iter()
        .filter(|definition| (definition.applies)(draft))
        .map(|definition| definition.step)
        .collect()
}

/// Result of asking the machine to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    Moved { from: Step, to: Step },
    /// `next()` on the last step: the caller should run the commit.
    SubmitRequested,
    Unchanged,
    Refused { target: Step, reason: JumpRefusal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpRefusal {
    NotApplicable,
    NotReached,
}

impl fmt::Display for JumpRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpRefusal::NotApplicable => f.write_str("step does not apply to this document type"),
            JumpRefusal::NotReached => f.write_str("step has not been reached yet"),
        }
    }
}

/// Current position of the wizard. Validation is not consulted here; callers
/// gate `next()` on the field validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMachine {
    current: Step,
    furthest: Step,
}

impl Default for StepMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StepMachine {
    pub fn new() -> Self {
        Self {
            current: Step::FIRST,
            furthest: Step::FIRST,
        }
    }

    /// Rebuilds the machine from a persisted step number. Everything up to
    /// the restored step counts as reached.
    pub fn restore(step: Step) -> Self {
        Self {
            current: step,
            furthest: step,
        }
    }

    pub fn current(&self) -> Step {
        self.current
    }

    pub fn furthest(&self) -> Step {
        self.furthest
    }

    /// Applicable steps before the current one.
    pub fn completed_steps(&self, draft: &SubmissionDraft) -> Vec<Step> {
        applicable_steps(draft)
            .into_iter()
            .filter(|step| *step < self.current)
            .collect()
    }

    pub fn next(&mut self, draft: &SubmissionDraft) -> StepTransition {
        if self.current == Step::LAST {
            return StepTransition::SubmitRequested;
        }
        let target = applicable_steps(draft)
            .into_iter()
            .find(|step| *step > self.current);
        match target {
            Some(to) => self.move_to(to),
            None => StepTransition::Unchanged,
        }
    }

    pub fn previous(&mut self, draft: &SubmissionDraft) -> StepTransition {
        let target = applicable_steps(draft)
            .into_iter()
            .rev()
            .find(|step| *step < self.current);
        match target {
            Some(to) => self.move_to(to),
            None => StepTransition::Unchanged,
        }
    }

    /// Moves directly to `target` if it has already been reached, or to the
    /// academic page straight from the first page. Never skips ahead.
    pub fn jump_to(&mut self, target: Step, draft: &SubmissionDraft) -> StepTransition {
        if target == self.current {
            return StepTransition::Unchanged;
        }
        if !target.is_applicable(draft) {
            return StepTransition::Refused {
                target,
                reason: JumpRefusal::NotApplicable,
            };
        }
        let academic_from_info = self.current == Step::Info && target == Step::Academic;
        if target <= self.furthest || academic_from_info {
            self.move_to(target)
        } else {
            StepTransition::Refused {
                target,
                reason: JumpRefusal::NotReached,
            }
        }
    }

    fn move_to(&mut self, to: Step) -> StepTransition {
        let from = self.current;
        self.current = to;
        if to > self.furthest {
            self.furthest = to;
        }
        tracing::debug!(from = from.number(), to = to.number(), "wizard step changed");
        StepTransition::Moved { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubflow_domain::DocumentType;

    fn draft_of(kind: DocumentType) -> SubmissionDraft {
        SubmissionDraft {
            document_type: kind,
            ..SubmissionDraft::default()
        }
    }

    #[test]
    fn non_academic_types_skip_academic_forward() {
        for kind in DocumentType::ALL.into_iter().filter(|k| !k.is_academic()) {
            let draft = draft_of(kind);
            let mut machine = StepMachine::new();
            assert_eq!(
                machine.next(&draft),
                StepTransition::Moved {
                    from: Step::Info,
                    to: Step::Document
                },
                "type {kind} must skip the academic page"
            );
        }
    }

    #[test]
    fn academic_types_visit_academic() {
        let draft = draft_of(DocumentType::Thesis);
        let mut machine = StepMachine::new();
        machine.next(&draft);
        assert_eq!(machine.current(), Step::Academic);
        machine.next(&draft);
        assert_eq!(machine.current(), Step::Document);
    }

    #[test]
    fn previous_mirrors_skip_logic() {
        let draft = draft_of(DocumentType::Article);
        let mut machine = StepMachine::restore(Step::Document);
        assert_eq!(
            machine.previous(&draft),
            StepTransition::Moved {
                from: Step::Document,
                to: Step::Info
            }
        );
        assert_eq!(machine.previous(&draft), StepTransition::Unchanged);
        assert_eq!(machine.current(), Step::Info);
    }

    #[test]
    fn next_on_payment_requests_submit() {
        let draft = draft_of(DocumentType::Article);
        let mut machine = StepMachine::restore(Step::Payment);
        assert_eq!(machine.next(&draft), StepTransition::SubmitRequested);
        assert_eq!(machine.current(), Step::Payment);
    }

    #[test]
    fn jump_to_current_is_noop() {
        let draft = draft_of(DocumentType::Thesis);
        let mut machine = StepMachine::restore(Step::Document);
        let before = machine.clone();
        assert_eq!(
            machine.jump_to(Step::Document, &draft),
            StepTransition::Unchanged
        );
        assert_eq!(machine, before);
    }

    #[test]
    fn jump_never_skips_ahead() {
        let draft = draft_of(DocumentType::Article);
        let mut machine = StepMachine::new();
        assert_eq!(
            machine.jump_to(Step::Payment, &draft),
            StepTransition::Refused {
                target: Step::Payment,
                reason: JumpRefusal::NotReached
            }
        );
        assert_eq!(machine.current(), Step::Info);
    }

    #[test]
    fn jump_back_within_reached_range() {
        let draft = draft_of(DocumentType::Article);
        let mut machine = StepMachine::new();
        machine.next(&draft);
        machine.next(&draft);
        assert_eq!(machine.current(), Step::Payment);
        machine.jump_to(Step::Info, &draft);
        assert_eq!(machine.current(), Step::Info);
        assert_eq!(machine.furthest(), Step::Payment);
        machine.jump_to(Step::Document, &draft);
        assert_eq!(machine.current(), Step::Document);
    }

    #[test]
    fn academic_reachable_from_info_only_when_applicable() {
        let mut machine = StepMachine::new();
        let article = draft_of(DocumentType::Article);
        assert!(matches!(
            machine.jump_to(Step::Academic, &article),
            StepTransition::Refused {
                reason: JumpRefusal::NotApplicable,
                ..
            }
        ));
        let thesis = draft_of(DocumentType::Thesis);
        assert_eq!(
            machine.jump_to(Step::Academic, &thesis),
            StepTransition::Moved {
                from: Step::Info,
                to: Step::Academic
            }
        );
    }

    #[test]
    fn completed_steps_are_derived_from_current() {
        let draft = draft_of(DocumentType::Thesis);
        let machine = StepMachine::restore(Step::Payment);
        assert_eq!(
            machine.completed_steps(&draft),
            vec![Step::Info, Step::Academic, Step::Document]
        );
        assert!(StepMachine::new().completed_steps(&draft).is_empty());
    }

    #[test]
    fn step_numbers_round_trip() {
        for number in 1..=4 {
            assert_eq!(Step::from_number(number).map(Step::number), Some(number));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(5), None);
    }
}
