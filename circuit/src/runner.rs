use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use hashbrown::HashMap;

use crate::error::CircuitError;
use crate::field::WitnessField;
use crate::graph::CircuitGraph;
use crate::types::{ConstId, InstanceId, TemplateId};

/// Named primary-input values for one evaluation.
#[derive(Debug, Clone)]
pub struct InputAssignment<F> {
    values: HashMap<String, Vec<F>>,
}

impl<F> InputAssignment<F> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set an array-valued input.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<F>) -> &mut Self {
        self.values.insert(name.into(), values);
        self
    }

    /// Set a scalar input.
    pub fn set_one(&mut self, name: impl Into<String>, value: F) -> &mut Self {
        self.values.insert(name.into(), alloc::vec![value]);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[F]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<F> Default for InputAssignment<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// The completed signal vector of a successful evaluation.
///
/// A fixed-length ordered sequence of field elements matching the compiled
/// graph's total signal count; the main instance's signals start at index 0
/// with its outputs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness<F> {
    values: Vec<F>,
}

impl<F> Witness<F> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&F> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[F] {
        &self.values
    }

    pub fn into_values(self) -> Vec<F> {
        self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstanceState {
    /// Created, waiting for inputs.
    Pending,
    /// Operation program currently executing.
    Running,
    /// Program completed; signals final.
    Finished,
    /// Transient bookkeeping reclaimed; signals remain part of the witness.
    Released,
}

/// One node of the runtime component tree.
///
/// Instances live in an integer-indexed arena with explicit parent/child
/// adjacency; there is no pointer-linked tree.
#[derive(Debug)]
struct ComponentInstance {
    template: TemplateId,
    signal_start: usize,
    remaining_inputs: usize,
    #[allow(dead_code)]
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    /// Dotted chain of component labels from the root, for diagnostics.
    path: String,
    state: InstanceState,
}

/// Evaluates a [`CircuitGraph`] into a [`Witness`].
///
/// The runner owns the signal vector and the instance arena exclusively for
/// the duration of one evaluation; execution is single-threaded, synchronous
/// and strictly depth-first. A component's program, and every execution it
/// triggers transitively, completes before control returns to the caller
/// that supplied its last input.
pub struct CircuitRunner<F: WitnessField> {
    graph: CircuitGraph<F>,
    signals: Vec<Option<F>>,
    instances: Vec<ComponentInstance>,
}

impl<F: WitnessField> CircuitRunner<F> {
    pub fn new(graph: CircuitGraph<F>) -> Self {
        let signals = alloc::vec![None; graph.total_signals()];
        Self {
            graph,
            signals,
            instances: Vec::new(),
        }
    }

    /// Run the whole circuit against the given primary inputs.
    ///
    /// Instantiates the root, supplies the bound inputs in declaration order
    /// (the root's program triggers on its last declared input, exactly like
    /// any subcomponent), then verifies that every instance ran and every
    /// signal was assigned exactly once before handing back the witness.
    /// Any failure aborts the run; no partial witness is ever returned.
    pub fn run(mut self, inputs: &InputAssignment<F>) -> Result<Witness<F>, CircuitError> {
        for name in inputs.names() {
            if self.graph.binding(name).is_none() {
                return Err(CircuitError::UnknownInput {
                    name: String::from(name),
                });
            }
        }

        let root = self.instantiate(self.graph.main(), 0, None, String::from("main"))?;

        let bindings = self.graph.input_bindings().to_vec();
        for binding in &bindings {
            let values = inputs
                .get(&binding.name)
                .ok_or_else(|| CircuitError::MissingInput {
                    name: binding.name.clone(),
                })?;
            if values.len() != binding.len {
                return Err(CircuitError::InputLengthMismatch {
                    name: binding.name.clone(),
                    expected: binding.len,
                    got: values.len(),
                });
            }
            for (offset, &value) in values.iter().enumerate() {
                self.supply_input(root, binding.offset + offset, value)?;
            }
        }

        for instance in &self.instances {
            if !matches!(
                instance.state,
                InstanceState::Finished | InstanceState::Released
            ) {
                return Err(CircuitError::InstanceNeverRan {
                    path: instance.path.clone(),
                });
            }
        }

        let mut values = Vec::with_capacity(self.signals.len());
        for (index, signal) in self.signals.iter().enumerate() {
            match signal {
                Some(value) => values.push(*value),
                None => return Err(CircuitError::SignalNeverAssigned { index }),
            }
        }

        self.release(root);
        Ok(Witness { values })
    }

    /// Allocate an instance record. A component with no declared inputs will
    /// never receive a triggering write, so it executes immediately.
    fn instantiate(
        &mut self,
        template: TemplateId,
        signal_start: usize,
        parent: Option<InstanceId>,
        path: String,
    ) -> Result<InstanceId, CircuitError> {
        let input_count = self.graph.template(template).input_count;
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(ComponentInstance {
            template,
            signal_start,
            remaining_inputs: input_count,
            parent,
            children: Vec::new(),
            path,
            state: InstanceState::Pending,
        });
        if input_count == 0 {
            self.execute(id)?;
        }
        Ok(id)
    }

    /// Write one declared input and decrement the readiness counter; when it
    /// reaches zero the instance's program executes immediately and
    /// synchronously, before this call returns.
    fn supply_input(
        &mut self,
        id: InstanceId,
        local: usize,
        value: F,
    ) -> Result<(), CircuitError> {
        let instance = &self.instances[id.0 as usize];
        let signal_start = instance.signal_start;
        let template_id = instance.template;
        match instance.state {
            InstanceState::Pending => {}
            InstanceState::Running => {
                return Err(CircuitError::InputWhileRunning {
                    path: instance.path.clone(),
                });
            }
            InstanceState::Finished | InstanceState::Released => {
                return Err(CircuitError::InputAfterRun {
                    path: instance.path.clone(),
                });
            }
        }

        let template = self.graph.template(template_id);
        let input_start = template.input_start();
        if local < input_start || local >= input_start + template.input_count {
            return Err(CircuitError::NotAnInput {
                template: template.name.clone(),
                index: local,
            });
        }

        self.set_signal(signal_start + local, value)?;

        let instance = &mut self.instances[id.0 as usize];
        instance.remaining_inputs -= 1;
        if instance.remaining_inputs == 0 {
            self.execute(id)?;
        }
        Ok(())
    }

    /// Dispatch an instance's operation program, exactly once.
    fn execute(&mut self, id: InstanceId) -> Result<(), CircuitError> {
        let instance = &self.instances[id.0 as usize];
        match instance.state {
            InstanceState::Pending => {}
            InstanceState::Running => {
                return Err(CircuitError::InputWhileRunning {
                    path: instance.path.clone(),
                });
            }
            InstanceState::Finished | InstanceState::Released => {
                return Err(CircuitError::InputAfterRun {
                    path: instance.path.clone(),
                });
            }
        }
        if instance.remaining_inputs != 0 {
            return Err(CircuitError::PrematureRun {
                path: instance.path.clone(),
                remaining: instance.remaining_inputs,
            });
        }

        self.instances[id.0 as usize].state = InstanceState::Running;
        self.create_children(id)?;

        let body = self.graph.template(self.instances[id.0 as usize].template).body.clone();
        let mut scope = ComponentScope { runner: self, id };
        body(&mut scope)?;

        self.instances[id.0 as usize].state = InstanceState::Finished;
        self.release_children(id);
        Ok(())
    }

    /// Expand the template's subcomponent specs into live instances,
    /// immediately before the parent's wiring begins. Children occupy
    /// consecutive footprint-sized signal blocks after the parent's own
    /// signals, in declaration order, so sibling ranges never overlap.
    fn create_children(&mut self, id: InstanceId) -> Result<(), CircuitError> {
        let instance = &self.instances[id.0 as usize];
        let template = self.graph.template(instance.template);
        let specs = template.subcomponents.clone();
        let parent_path = instance.path.clone();
        let mut cursor = instance.signal_start + template.signal_count;

        let mut children = Vec::new();
        for spec in &specs {
            for index in 0..spec.count {
                let path = if spec.count == 1 {
                    format!("{parent_path}.{}", spec.label)
                } else {
                    format!("{parent_path}.{}[{index}]", spec.label)
                };
                let child = self.instantiate(spec.template, cursor, Some(id), path)?;
                cursor += self.graph.footprint(spec.template);
                children.push(child);
            }
        }
        self.instances[id.0 as usize].children = children;
        Ok(())
    }

    /// Reclaim the transient bookkeeping of every finished child. Signal
    /// values are never touched; they stay part of the witness.
    fn release_children(&mut self, id: InstanceId) {
        let children = self.instances[id.0 as usize].children.clone();
        for child in children {
            if self.instances[child.0 as usize].state == InstanceState::Finished {
                self.release(child);
            }
        }
    }

    fn release(&mut self, id: InstanceId) {
        let instance = &mut self.instances[id.0 as usize];
        instance.state = InstanceState::Released;
        instance.remaining_inputs = 0;
        mem::take(&mut instance.children);
    }

    fn set_signal(&mut self, index: usize, value: F) -> Result<(), CircuitError> {
        match self.signals[index] {
            Some(_) => Err(CircuitError::SignalReassigned { index }),
            None => {
                self.signals[index] = Some(value);
                Ok(())
            }
        }
    }

    fn get_signal(&self, index: usize) -> Result<F, CircuitError> {
        self.signals[index].ok_or(CircuitError::SignalUnset { index })
    }
}

/// Execution context handed to a template's operation program.
///
/// Resolves the running instance's local signal indices to global offsets,
/// exposes the shared constant pool, wires subcomponent inputs (possibly
/// triggering their execution in place) and checks assertions with full
/// component-trace diagnostics.
pub struct ComponentScope<'a, F: WitnessField> {
    runner: &'a mut CircuitRunner<F>,
    id: InstanceId,
}

impl<'a, F: WitnessField> ComponentScope<'a, F> {
    fn instance(&self) -> &ComponentInstance {
        &self.runner.instances[self.id.0 as usize]
    }

    fn template_name(&self) -> &str {
        &self.runner.graph.template(self.instance().template).name
    }

    /// Look up a pool constant.
    pub fn constant(&self, id: ConstId) -> F {
        *self.runner.graph.constant(id)
    }

    fn check_local(&self, local: usize) -> Result<(), CircuitError> {
        let template = self.runner.graph.template(self.instance().template);
        if local >= template.signal_count {
            return Err(CircuitError::LocalIndexOutOfRange {
                template: template.name.clone(),
                index: local,
            });
        }
        Ok(())
    }

    /// Read one of the component's own signals.
    pub fn get(&self, local: usize) -> Result<F, CircuitError> {
        self.check_local(local)?;
        self.runner.get_signal(self.instance().signal_start + local)
    }

    /// Assign one of the component's own signals, exactly once.
    pub fn set(&mut self, local: usize, value: F) -> Result<(), CircuitError> {
        self.check_local(local)?;
        let index = self.instance().signal_start + local;
        self.runner.set_signal(index, value)
    }

    fn child(&self, slot: usize) -> Result<InstanceId, CircuitError> {
        self.instance().children.get(slot).copied().ok_or_else(|| {
            CircuitError::ChildSlotOutOfRange {
                template: String::from(self.template_name()),
                slot,
            }
        })
    }

    /// Read a signal of a subcomponent, typically one of its outputs.
    pub fn child_output(&self, slot: usize, local: usize) -> Result<F, CircuitError> {
        let child = self.child(slot)?;
        let instance = &self.runner.instances[child.0 as usize];
        let template = self.runner.graph.template(instance.template);
        if local >= template.signal_count {
            return Err(CircuitError::LocalIndexOutOfRange {
                template: template.name.clone(),
                index: local,
            });
        }
        self.runner.get_signal(instance.signal_start + local)
    }

    /// Supply one input of a subcomponent. If this is the child's last
    /// outstanding input, the child's program runs to completion inside this
    /// call, honoring the declared wiring order.
    pub fn feed_child(
        &mut self,
        slot: usize,
        local: usize,
        value: F,
    ) -> Result<(), CircuitError> {
        let child = self.child(slot)?;
        self.runner.supply_input(child, local, value)
    }

    /// Check an assertion predicate; a false predicate aborts the whole
    /// evaluation with the owning template's name, the source tag and the
    /// component trace.
    pub fn ensure(&self, condition: bool, tag: &'static str) -> Result<(), CircuitError> {
        if condition {
            Ok(())
        } else {
            Err(CircuitError::ConstraintViolation {
                template: String::from(self.template_name()),
                tag,
                path: self.instance().path.clone(),
            })
        }
    }

    /// Equality assertion.
    pub fn ensure_eq(&self, lhs: F, rhs: F, tag: &'static str) -> Result<(), CircuitError> {
        self.ensure(lhs == rhs, tag)
    }
}
