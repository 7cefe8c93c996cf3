// Selection state machine - keeps product/machine selection valid against the latest info
use crate::domain::model::{InfoResponse, Machine, MachineId};
use crate::domain::settings::ChartSettings;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    InfoArrived(InfoResponse),
    ProductChanged {
        new: Option<String>,
        old: Option<String>,
    },
    MachineChanged {
        new: Option<MachineId>,
        old: Option<MachineId>,
    },
}

impl SelectionEvent {
    fn kind(&self) -> &'static str {
        match self {
            SelectionEvent::InfoArrived(_) => "info arrived",
            SelectionEvent::ProductChanged { .. } => "product changed",
            SelectionEvent::MachineChanged { .. } => "machine changed",
        }
    }
}

/// Product/machine pair whose line and clustered data must be (re)loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRound {
    pub product: String,
    pub machine: MachineId,
}

enum Step {
    Event(SelectionEvent),
    // Machine repair for whatever pair is current when the step runs
    RepairMachine,
}

#[derive(Debug, Default)]
pub struct SelectionStateMachine {
    info: Option<InfoResponse>,
    products: Vec<String>,
    machines: Vec<Machine>,
}

impl SelectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> Option<&InfoResponse> {
        self.info.as_ref()
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// User picked a product. Fires `ProductChanged` only if the value actually changed.
    pub fn select_product(
        &mut self,
        settings: &mut ChartSettings,
        product: Option<String>,
    ) -> Option<FetchRound> {
        if settings.selected_product == product {
            return None;
        }
        let old = std::mem::replace(&mut settings.selected_product, product.clone());
        self.dispatch(settings, SelectionEvent::ProductChanged { new: product, old })
    }

    /// User picked a machine. Fires `MachineChanged` only if the value actually changed.
    pub fn select_machine(
        &mut self,
        settings: &mut ChartSettings,
        machine: Option<MachineId>,
    ) -> Option<FetchRound> {
        if settings.selected_machine == machine {
            return None;
        }
        let old = std::mem::replace(&mut settings.selected_machine, machine);
        self.dispatch(settings, SelectionEvent::MachineChanged { new: machine, old })
    }

    /// Runs the event and every change event its repairs cause, in order, before
    /// returning. However many repairs request a fetch along the way, the caller gets
    /// at most one round: the pair the selection settled on.
    pub fn dispatch(
        &mut self,
        settings: &mut ChartSettings,
        event: SelectionEvent,
    ) -> Option<FetchRound> {
        let mut queue = VecDeque::from([Step::Event(event)]);
        let mut round = None;

        while let Some(step) = queue.pop_front() {
            let requested = match step {
                Step::Event(event) => {
                    tracing::debug!("Selection event: {}", event.kind());
                    match event {
                        SelectionEvent::InfoArrived(info) => {
                            self.on_info_arrived(settings, info, &mut queue);
                            None
                        }
                        SelectionEvent::ProductChanged { new, old } => {
                            self.on_product_changed(settings, new, old, &mut queue)
                        }
                        SelectionEvent::MachineChanged { new, old } => {
                            tracing::debug!("Machine {:?} -> {:?}", old, new);
                            self.on_machine_changed(settings, new)
                        }
                    }
                }
                Step::RepairMachine => self.on_machine_changed(settings, settings.selected_machine),
            };

            if requested.is_some() {
                round = requested;
            }
        }

        if let Some(r) = &round {
            tracing::debug!("Selection settled on product={} machine={}", r.product, r.machine);
        }
        round
    }

    fn on_info_arrived(
        &mut self,
        settings: &mut ChartSettings,
        info: InfoResponse,
        queue: &mut VecDeque<Step>,
    ) {
        self.products = info.product_names.clone();
        self.info = Some(info);

        let previous = settings.selected_product.clone();
        let repaired = match settings.product() {
            _ if self.products.is_empty() => None,
            Some(p) if self.products.iter().any(|known| known == p) => Some(p.to_string()),
            _ => self.products.first().cloned(),
        };
        settings.selected_product = repaired.clone();

        // Machines must be recomputed once per info even if the product is unchanged
        queue.push_back(Step::Event(SelectionEvent::ProductChanged {
            new: repaired,
            old: previous,
        }));
        queue.push_back(Step::RepairMachine);
    }

    fn on_product_changed(
        &mut self,
        settings: &mut ChartSettings,
        product: Option<String>,
        old: Option<String>,
        queue: &mut VecDeque<Step>,
    ) -> Option<FetchRound> {
        tracing::debug!("Product {:?} -> {:?}", old, product);
        let info = self.info.as_ref()?;

        let product = product.filter(|p| !p.is_empty());
        self.machines = match &product {
            Some(p) => info.machines_of(p).to_vec(),
            None => Vec::new(),
        };

        let previous = settings.selected_machine;
        let repaired = match previous {
            _ if self.machines.is_empty() => None,
            Some(id) if self.machines.iter().any(|m| m.id == id) => Some(id),
            _ => self.machines.first().map(|m| m.id),
        };

        if repaired == previous {
            // No machine change event will follow, so the reload has to start here
            match (product, repaired) {
                (Some(product), Some(machine)) => Some(FetchRound { product, machine }),
                _ => None,
            }
        } else {
            settings.selected_machine = repaired;
            queue.push_back(Step::Event(SelectionEvent::MachineChanged {
                new: repaired,
                old: previous,
            }));
            None
        }
    }

    fn on_machine_changed(
        &self,
        settings: &ChartSettings,
        machine: Option<MachineId>,
    ) -> Option<FetchRound> {
        let machine = machine?;
        let product = settings.product()?;
        Some(FetchRound {
            product: product.to_string(),
            machine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn info(products: &[(&str, Vec<MachineId>)]) -> InfoResponse {
        let mut product_to_machine = HashMap::new();
        for (name, ids) in products {
            let machines = ids
                .iter()
                .map(|id| Machine::new(*id, format!("machine-{}", id)))
                .collect();
            product_to_machine.insert(name.to_string(), machines);
        }
        InfoResponse {
            product_names: products.iter().map(|(name, _)| name.to_string()).collect(),
            product_to_machine,
            ..Default::default()
        }
    }

    fn settings(product: Option<&str>, machine: Option<MachineId>) -> ChartSettings {
        ChartSettings {
            selected_product: product.map(str::to_string),
            selected_machine: machine,
            ..Default::default()
        }
    }

    fn round(product: &str, machine: MachineId) -> Option<FetchRound> {
        Some(FetchRound {
            product: product.to_string(),
            machine,
        })
    }

    fn sample_info() -> InfoResponse {
        info(&[("A", vec![1]), ("B", vec![2, 3])])
    }

    #[test]
    fn test_empty_products_clear_selection() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("A"), Some(1));

        let fetch = machine.dispatch(&mut settings, SelectionEvent::InfoArrived(info(&[])));

        assert_eq!(settings.product(), None);
        assert_eq!(settings.selected_machine, None);
        assert!(machine.products().is_empty());
        assert!(machine.machines().is_empty());
        assert_eq!(fetch, None);
    }

    #[test]
    fn test_unknown_product_repairs_to_first() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("WS"), Some(3));

        let fetch = machine.dispatch(&mut settings, SelectionEvent::InfoArrived(sample_info()));

        assert_eq!(settings.product(), Some("A"));
        assert_eq!(settings.selected_machine, Some(1));
        assert_eq!(fetch, round("A", 1));
    }

    #[test]
    fn test_missing_selection_repairs_to_first() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(None, None);

        let fetch = machine.dispatch(&mut settings, SelectionEvent::InfoArrived(sample_info()));

        assert_eq!(settings.product(), Some("A"));
        assert_eq!(machine.machines(), &[Machine::new(1, "machine-1")]);
        assert_eq!(fetch, round("A", 1));
    }

    #[test]
    fn test_valid_selection_survives_info_and_fetches_once() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("B"), Some(3));

        let fetch = machine.dispatch(&mut settings, SelectionEvent::InfoArrived(sample_info()));

        assert_eq!(settings.product(), Some("B"));
        assert_eq!(settings.selected_machine, Some(3));
        assert_eq!(machine.products(), &["A".to_string(), "B".to_string()]);
        assert_eq!(machine.machines().len(), 2);
        assert_eq!(fetch, round("B", 3));
    }

    #[test]
    fn test_product_change_repairs_invalid_machine() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("B"), Some(3));
        machine.dispatch(&mut settings, SelectionEvent::InfoArrived(sample_info()));

        let fetch = machine.select_product(&mut settings, Some("A".to_string()));

        assert_eq!(settings.selected_machine, Some(1));
        assert_eq!(fetch, round("A", 1));
    }

    #[test]
    fn test_product_change_keeping_machine_still_fetches() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("A"), Some(2));
        let info = info(&[("A", vec![1, 2]), ("B", vec![2])]);
        machine.dispatch(&mut settings, SelectionEvent::InfoArrived(info));

        let fetch = machine.select_product(&mut settings, Some("B".to_string()));

        assert_eq!(settings.selected_machine, Some(2));
        assert_eq!(fetch, round("B", 2));
    }

    #[test]
    fn test_product_without_machines_clears_machine() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("A"), Some(1));
        let info = info(&[("A", vec![1]), ("C", vec![])]);
        machine.dispatch(&mut settings, SelectionEvent::InfoArrived(info));

        let fetch = machine.select_product(&mut settings, Some("C".to_string()));

        assert_eq!(settings.selected_machine, None);
        assert_eq!(fetch, None);
    }

    #[test]
    fn test_product_change_before_info_is_ignored() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(None, Some(5));

        let fetch = machine.select_product(&mut settings, Some("A".to_string()));

        assert_eq!(settings.product(), Some("A"));
        assert_eq!(settings.selected_machine, Some(5));
        assert_eq!(fetch, None);
    }

    #[test]
    fn test_same_product_does_not_fire() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("B"), Some(2));
        machine.dispatch(&mut settings, SelectionEvent::InfoArrived(sample_info()));

        assert_eq!(machine.select_product(&mut settings, Some("B".to_string())), None);
        assert_eq!(machine.select_machine(&mut settings, Some(2)), None);
    }

    #[test]
    fn test_machine_change_fetches_for_current_product() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some("B"), Some(2));
        machine.dispatch(&mut settings, SelectionEvent::InfoArrived(sample_info()));

        assert_eq!(machine.select_machine(&mut settings, Some(3)), round("B", 3));
        assert_eq!(machine.select_machine(&mut settings, None), None);
    }

    #[test]
    fn test_machine_change_without_product_is_noop() {
        let mut machine = SelectionStateMachine::new();
        let mut settings = settings(Some(""), None);

        let fetch = machine.dispatch(
            &mut settings,
            SelectionEvent::MachineChanged {
                new: Some(4),
                old: None,
            },
        );

        assert_eq!(fetch, None);
    }
}
