// [tests/mirror/libs/infra/bus/loopback_bus.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL BUS LOOPBACK (V5.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: CODEC DE CABLE, FILTRADO Y DESPACHO DE HANDLERS
 * =================================================================
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telar_domain_models::{AgentStatus, MessagePayload};
use telar_infra_bus::{BusLink, LoopbackLink, MessageBus};

fn wired_pair() -> (MessageBus, MessageBus) {
    let (controller_side, agent_side) = LoopbackLink::pair();
    let controller = MessageBus::new(
        "coordinator",
        Some("Telar Control".into()),
        Arc::new(controller_side) as Arc<dyn BusLink>,
    );
    let agent = MessageBus::new(
        "crafter-7",
        Some("Forge Alpha".into()),
        Arc::new(agent_side) as Arc<dyn BusLink>,
    );
    (controller, agent)
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Roundtrip MessagePack de un sobre dirigido.
     */
    #[tokio::test]
    async fn certify_wire_roundtrip() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating MessagePack wire roundtrip...");

        let (controller, agent) = wired_pair();

        agent
            .send(
                MessagePayload::Status {
                    status: AgentStatus::Idle,
                    current_job: Some(42),
                    stats: None,
                    progress: Some(0.5),
                },
                "coordinator",
            )
            .await
            .expect("loopback transmit");

        let received = controller
            .receive(Some(Duration::from_secs(1)))
            .await
            .expect("link alive")
            .expect("envelope within bound");

        assert_eq!(received.sender_id, "crafter-7");
        assert_eq!(received.payload.kind(), "STATUS");
        if let MessagePayload::Status { status, current_job, .. } = received.payload {
            assert_eq!(status, AgentStatus::Idle);
            assert_eq!(current_job, Some(42));
        } else {
            panic!("INTEGRITY_COLLAPSE: Payload variant corrupted during transit.");
        }

        println!("   ✅ [SUCCESS]: Wire roundtrip certified.");
    }

    /**
     * CERTIFICACIÓN: Filtrado por destinatario exclusivo.
     */
    #[tokio::test]
    async fn certify_target_filtering() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating target filtering...");

        let (controller, agent) = wired_pair();

        // Sobre para un tercero: el coordinador debe ignorarlo
        agent
            .send(
                MessagePayload::Pong { status: None, current_job: None },
                "someone-else",
            )
            .await
            .expect("transmit");

        let filtered = controller
            .receive(Some(Duration::from_millis(200)))
            .await
            .expect("link alive");
        assert!(filtered.is_none(), "Foreign-target envelopes must be silently dropped.");

        // Difusión sin destinatario: todos los oyentes la procesan
        agent
            .broadcast(MessagePayload::Pong { status: None, current_job: None })
            .await
            .expect("transmit");
        let broadcast = controller
            .receive(Some(Duration::from_secs(1)))
            .await
            .expect("link alive");
        assert!(broadcast.is_some());

        println!("   ✅ [SUCCESS]: Filtering certified.");
    }

    /**
     * CERTIFICACIÓN: La bomba despacha handlers síncronos por tipo
     * y tolera tramas indescifrables (ProtocolError no fatal).
     */
    #[tokio::test]
    async fn certify_handler_dispatch_and_protocol_tolerance() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating handler dispatch...");

        // Par manual: inyectamos una trama corrupta ANTES de envolver
        // el extremo del agente, para que preceda al sobre legítimo.
        let (controller_side, agent_side) = LoopbackLink::pair();
        agent_side
            .transmit(&[0xDE, 0xAD, 0xBE, 0xEF])
            .await
            .expect("raw frame");

        let controller = MessageBus::new(
            "coordinator",
            None,
            Arc::new(controller_side) as Arc<dyn BusLink>,
        );
        let agent = MessageBus::new(
            "crafter-7",
            None,
            Arc::new(agent_side) as Arc<dyn BusLink>,
        );

        let status_hits = Arc::new(AtomicUsize::new(0));
        let hits_probe = Arc::clone(&status_hits);
        controller.on("STATUS", move |envelope| {
            assert_eq!(envelope.sender_id, "crafter-7");
            hits_probe.fetch_add(1, Ordering::SeqCst);
        });

        agent
            .send(
                MessagePayload::Status {
                    status: AgentStatus::Busy,
                    current_job: Some(7),
                    stats: None,
                    progress: None,
                },
                "coordinator",
            )
            .await
            .expect("transmit");

        let dispatched_kind = controller
            .pump_once(Some(Duration::from_secs(1)))
            .await
            .expect("pump survives")
            .expect("envelope within bound");

        assert_eq!(dispatched_kind, "STATUS");
        assert_eq!(status_hits.load(Ordering::SeqCst), 1);

        println!("   ✅ [SUCCESS]: Dispatch certified.");
    }
}
