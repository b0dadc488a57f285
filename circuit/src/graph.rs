use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use itertools::Itertools;

use crate::error::CircuitError;
use crate::field::WitnessField;
use crate::runner::{CircuitRunner, ComponentScope};
use crate::types::{ConstId, TemplateId};

/// A template's operation program.
///
/// Programs run against a [`ComponentScope`] that exposes the component's
/// own signals, its subcomponents and the shared constant pool. Loops and
/// conditionals with statically-bounded iteration counts are expressed as
/// ordinary Rust control flow inside the closure; the closure is shared by
/// every instance of the template.
pub type TemplateBody<F> = Arc<dyn Fn(&mut ComponentScope<'_, F>) -> Result<(), CircuitError>>;

/// Static description of one subcomponent slot group.
///
/// `count > 1` describes a statically-sized array of identical
/// subcomponents; the slots expand in declaration order when the parent
/// runs, each child occupying the next footprint-sized signal block.
#[derive(Clone)]
pub struct SubcomponentSpec {
    /// Label used to build the dotted instance path (`parent.label[i]`).
    pub label: String,
    /// Template instantiated in this slot group.
    pub template: TemplateId,
    /// Number of repetitions; always a compile-time constant.
    pub count: usize,
}

impl SubcomponentSpec {
    pub fn new(label: impl Into<String>, template: TemplateId, count: usize) -> Self {
        Self {
            label: label.into(),
            template,
            count,
        }
    }

    /// Convenience for the common single-instance slot.
    pub fn single(label: impl Into<String>, template: TemplateId) -> Self {
        Self::new(label, template, 1)
    }
}

/// Static description of a component type.
///
/// A template owns `signal_count` signals laid out as
/// `[outputs][inputs][intermediates]`; its subcomponents' signal blocks
/// follow immediately after, in declaration order. The instance runs its
/// `body` exactly once, the moment its last declared input is supplied.
pub struct ComponentTemplate<F: WitnessField> {
    pub name: String,
    /// Own signals only, excluding subcomponent footprints.
    pub signal_count: usize,
    pub output_count: usize,
    pub input_count: usize,
    pub subcomponents: Vec<SubcomponentSpec>,
    pub body: TemplateBody<F>,
}

impl<F: WitnessField> ComponentTemplate<F> {
    /// Local index of the first declared input (outputs come first).
    pub const fn input_start(&self) -> usize {
        self.output_count
    }
}

impl<F: WitnessField> fmt::Debug for ComponentTemplate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTemplate")
            .field("name", &self.name)
            .field("signal_count", &self.signal_count)
            .field("output_count", &self.output_count)
            .field("input_count", &self.input_count)
            .field("subcomponents", &self.subcomponents.len())
            .finish()
    }
}

/// Named slice of the main template's input segment.
#[derive(Debug, Clone)]
pub struct InputBinding {
    pub name: String,
    /// Local signal offset on the main template.
    pub offset: usize,
    pub len: usize,
}

/// Immutable compiled circuit graph.
///
/// Built once by a [`GraphBuilder`] and read-only thereafter: the template
/// registry, the shared constant pool, per-template signal footprints and
/// the named primary-input bindings of the main template. Use
/// [`CircuitGraph::runner`] to evaluate it against concrete inputs.
pub struct CircuitGraph<F: WitnessField> {
    templates: Vec<ComponentTemplate<F>>,
    constants: Vec<F>,
    footprints: Vec<usize>,
    main: TemplateId,
    input_bindings: Vec<InputBinding>,
}

impl<F: WitnessField> CircuitGraph<F> {
    pub fn template(&self, id: TemplateId) -> &ComponentTemplate<F> {
        &self.templates[id.0 as usize]
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Own signals plus all transitive subcomponent signals.
    pub fn footprint(&self, id: TemplateId) -> usize {
        self.footprints[id.0 as usize]
    }

    pub fn main(&self) -> TemplateId {
        self.main
    }

    /// Length of the signal vector; the main instance starts at offset 0.
    pub fn total_signals(&self) -> usize {
        self.footprint(self.main)
    }

    pub fn constant(&self, id: ConstId) -> &F {
        &self.constants[id.0 as usize]
    }

    pub fn constant_pool(&self) -> &[F] {
        &self.constants
    }

    pub fn input_bindings(&self) -> &[InputBinding] {
        &self.input_bindings
    }

    pub fn binding(&self, name: &str) -> Option<&InputBinding> {
        self.input_bindings.iter().find(|b| b.name == name)
    }
}

impl<F: WitnessField> CircuitGraph<F> {
    /// Create an evaluator for this graph.
    pub fn runner(self) -> CircuitRunner<F> {
        CircuitRunner::new(self)
    }
}

impl<F: WitnessField> fmt::Debug for CircuitGraph<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitGraph")
            .field("templates", &self.templates.len())
            .field("constants", &self.constants.len())
            .field("total_signals", &self.footprints[self.main.0 as usize])
            .finish()
    }
}

/// Builder for [`CircuitGraph`].
///
/// Interns constants into the shared pool, registers templates, caches
/// gadget templates by `(name, parameters)` so each parameterization exists
/// exactly once, and validates the whole graph in [`GraphBuilder::build`].
pub struct GraphBuilder<F: WitnessField> {
    templates: Vec<ComponentTemplate<F>>,
    constants: Vec<F>,
    const_index: HashMap<u64, ConstId>,
    gadget_cache: HashMap<(String, Vec<u64>), TemplateId>,
    main: Option<TemplateId>,
    input_bindings: Vec<InputBinding>,
}

impl<F: WitnessField> GraphBuilder<F> {
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            constants: Vec::new(),
            const_index: HashMap::new(),
            gadget_cache: HashMap::new(),
            main: None,
            input_bindings: Vec::new(),
        }
    }

    /// Intern a constant into the pool, deduplicating by value.
    pub fn constant(&mut self, value: F) -> ConstId {
        let key = value.as_canonical_u64();
        if let Some(&id) = self.const_index.get(&key) {
            return id;
        }
        let id = ConstId(self.constants.len() as u32);
        self.constants.push(value);
        self.const_index.insert(key, id);
        id
    }

    /// Register a template and return its id.
    pub fn add_template(&mut self, template: ComponentTemplate<F>) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        self.templates.push(template);
        id
    }

    /// Register-once lookup for parameterized gadget templates.
    ///
    /// The first call for a given `(name, params)` key runs `build` and
    /// caches the resulting id; later calls return the cached template.
    pub fn gadget(
        &mut self,
        name: &str,
        params: &[u64],
        build: impl FnOnce(&mut Self) -> TemplateId,
    ) -> TemplateId {
        let key = (String::from(name), params.to_vec());
        if let Some(&id) = self.gadget_cache.get(&key) {
            return id;
        }
        let id = build(self);
        self.gadget_cache.insert(key, id);
        id
    }

    pub fn set_main(&mut self, id: TemplateId) {
        self.main = Some(id);
    }

    /// Declare a named primary input covering `len` consecutive signals of
    /// the main template, starting at local offset `offset`.
    pub fn bind_input(&mut self, name: impl Into<String>, offset: usize, len: usize) {
        self.input_bindings.push(InputBinding {
            name: name.into(),
            offset,
            len,
        });
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<CircuitGraph<F>, CircuitError> {
        let main = self.main.ok_or(CircuitError::MissingMain)?;

        for template in &self.templates {
            if template.input_count > template.signal_count {
                return Err(CircuitError::InvalidTemplate {
                    template: template.name.clone(),
                    reason: "declared input count exceeds signal count",
                });
            }
            if template.output_count + template.input_count > template.signal_count {
                return Err(CircuitError::InvalidTemplate {
                    template: template.name.clone(),
                    reason: "outputs and inputs overflow the signal footprint",
                });
            }
            for spec in &template.subcomponents {
                if spec.template.0 as usize >= self.templates.len() {
                    return Err(CircuitError::UnknownTemplate {
                        parent: template.name.clone(),
                        child: spec.template.0,
                    });
                }
            }
        }

        let footprints = self.compute_footprints()?;
        self.validate_bindings(main)?;

        Ok(CircuitGraph {
            templates: self.templates,
            constants: self.constants,
            footprints,
            main,
            input_bindings: self.input_bindings,
        })
    }

    /// Memoized subtree signal counts, with cycle detection.
    fn compute_footprints(&self) -> Result<Vec<usize>, CircuitError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done(usize),
        }

        fn visit<F: WitnessField>(
            templates: &[ComponentTemplate<F>],
            marks: &mut [Mark],
            id: usize,
        ) -> Result<usize, CircuitError> {
            match marks[id] {
                Mark::Done(size) => return Ok(size),
                Mark::Visiting => {
                    return Err(CircuitError::RecursiveTemplate {
                        template: templates[id].name.clone(),
                    });
                }
                Mark::Unvisited => {}
            }
            marks[id] = Mark::Visiting;
            let mut size = templates[id].signal_count;
            for spec in &templates[id].subcomponents {
                size += spec.count * visit(templates, marks, spec.template.0 as usize)?;
            }
            marks[id] = Mark::Done(size);
            Ok(size)
        }

        let mut marks = alloc::vec![Mark::Unvisited; self.templates.len()];
        let mut footprints = alloc::vec![0; self.templates.len()];
        for id in 0..self.templates.len() {
            footprints[id] = visit(&self.templates, &mut marks, id)?;
        }
        Ok(footprints)
    }

    /// Bindings must tile the main template's input segment exactly.
    fn validate_bindings(&self, main: TemplateId) -> Result<(), CircuitError> {
        let template = &self.templates[main.0 as usize];
        let input_start = template.input_start();
        let input_end = input_start + template.input_count;

        for binding in &self.input_bindings {
            if binding.len == 0 {
                return Err(CircuitError::InvalidInputBinding {
                    name: binding.name.clone(),
                    reason: "binding is empty",
                });
            }
            if binding.offset < input_start || binding.offset + binding.len > input_end {
                return Err(CircuitError::InvalidInputBinding {
                    name: binding.name.clone(),
                    reason: "binding falls outside the main input segment",
                });
            }
        }

        let covered: usize = self.input_bindings.iter().map(|b| b.len).sum();
        if covered != template.input_count {
            return Err(CircuitError::InvalidInputBinding {
                name: String::from("<all>"),
                reason: "bindings do not cover every declared input",
            });
        }

        let overlapping = self
            .input_bindings
            .iter()
            .map(|b| (b.offset, b.offset + b.len))
            .sorted()
            .tuple_windows()
            .any(|(a, b)| b.0 < a.1);
        if overlapping {
            return Err(CircuitError::InvalidInputBinding {
                name: String::from("<all>"),
                reason: "bindings overlap",
            });
        }

        Ok(())
    }
}

impl<F: WitnessField> Default for GraphBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}
