//! # Registry Flow
//!
//! Governance administration as seen by the engine.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use sg_01_module_registry::ModuleStatus;
    use sg_03_action_engine::prelude::*;
    use shared_bus::GraphEvent;
    use std::sync::Arc;

    #[test]
    fn test_only_governance_whitelists() {
        let harness = Harness::new();
        let err = harness
            .graph
            .registry
            .set_whitelisted(HUB, ECHO_MODULE, true)
            .unwrap_err();

        assert_eq!(err, ActionError::Unauthorized { caller: HUB });
        assert!(!harness.graph.registry.is_whitelisted(ECHO_MODULE));
    }

    #[test]
    fn test_whitelist_notifications_published_immediately() {
        let harness = Harness::new();
        let mut sub = harness.subscribe();

        harness
            .graph
            .registry
            .register(ECHO_MODULE, Arc::new(EchoModule::default()))
            .unwrap();
        harness
            .graph
            .registry
            .set_whitelisted(GOV, ECHO_MODULE, true)
            .unwrap();

        let events = sub.drain();
        assert_eq!(event_names(&events), vec!["ModuleRegistered", "ModuleWhitelisted"]);
        assert!(matches!(
            &events[0],
            GraphEvent::ModuleRegistered { name, .. } if name == "echo"
        ));
        assert_eq!(
            harness.graph.registry.status(ECHO_MODULE),
            ModuleStatus {
                registered: true,
                whitelisted: true
            }
        );
    }

    #[test]
    fn test_handover_moves_whitelist_power() {
        let harness = Harness::new();
        let next = Address::from_low_u8(0x03);
        harness.graph.registry.set_governance(GOV, next).unwrap();
        harness
            .graph
            .registry
            .register(ECHO_MODULE, Arc::new(EchoModule::default()))
            .unwrap();

        assert!(harness
            .graph
            .registry
            .set_whitelisted(GOV, ECHO_MODULE, true)
            .is_err());
        harness
            .graph
            .registry
            .set_whitelisted(next, ECHO_MODULE, true)
            .unwrap();

        assert!(harness.attach(post(), ECHO_MODULE).is_ok());
    }

    #[test]
    fn test_whitelisted_but_unregistered_cannot_attach() {
        let harness = Harness::new();
        harness
            .graph
            .registry
            .set_whitelisted(GOV, ECHO_MODULE, true)
            .unwrap();

        assert_eq!(
            harness.attach(post(), ECHO_MODULE).unwrap_err(),
            ActionError::UnknownModule(ECHO_MODULE)
        );
    }
}
