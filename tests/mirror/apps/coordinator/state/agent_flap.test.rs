// [tests/mirror/apps/coordinator/state/agent_flap.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE ALETEO DE AGENTES (V7.2 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: TRANSICIONES DE SALUD EXACTAS BAJO RELOJ SINTÉTICO
 *
 * # Mathematical Proof (Transition Exactness):
 * Con umbrales 30 s / 120 s y latidos en t=0 y t=10 s seguidos de
 * silencio hasta un PONG en t=90 s, la salud cruza exactamente
 * online -> degraded -> online y JAMÁS toca offline.
 * =================================================================
 */

use std::collections::BTreeSet;
use telar_coordinator::state::AgentRegistry;
use telar_domain_models::{AgentHealth, AgentKind, AgentStatus};

const DEGRADED_AFTER_MS: u64 = 30_000;
const OFFLINE_AFTER_MS: u64 = 120_000;

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Escenario de aleteo del agente #7.
     */
    #[test]
    fn certify_agent_flap_transitions() {
        println!("\n🧪 [PROVING_GROUNDS]: Scenario: agent #7 flap without offline...");

        let registry = AgentRegistry::new(DEGRADED_AFTER_MS, OFFLINE_AFTER_MS);
        let epoch_ms = 1_000_000u64;
        let mut observed_transitions = Vec::new();

        // STATUS en t=0 y t=10s (auto-registro con capacidades vacías)
        registry.update_status("7", AgentKind::Worker, AgentStatus::Idle, None, epoch_ms);
        observed_transitions.extend(registry.sweep(epoch_ms));
        registry.update_status("7", AgentKind::Worker, AgentStatus::Idle, None, epoch_ms + 10_000);
        observed_transitions.extend(registry.sweep(epoch_ms + 15_000));

        assert!(observed_transitions.is_empty(), "Fresh heartbeats yield no transitions.");

        // Silencio: en t=+45s la edad es 35s -> degraded
        let degraded_sweep = registry.sweep(epoch_ms + 45_000);
        assert_eq!(
            degraded_sweep,
            vec![("7".to_string(), AgentHealth::Degraded, AgentHealth::Online)]
        );
        observed_transitions.extend(degraded_sweep);

        // Silencio continuado por debajo del umbral offline: sin eventos
        assert!(registry.sweep(epoch_ms + 70_000).is_empty(),
            "No event while health stays degraded.");

        // PONG en t=+90s: recuperación inmediata
        registry.touch("7", AgentKind::Worker, epoch_ms + 90_000);
        let recovery_sweep = registry.sweep(epoch_ms + 90_000);
        assert_eq!(
            recovery_sweep,
            vec![("7".to_string(), AgentHealth::Online, AgentHealth::Degraded)]
        );
        observed_transitions.extend(recovery_sweep);

        // JAMÁS offline: la edad nunca alcanzó los 120 s
        assert!(
            observed_transitions
                .iter()
                .all(|(_, health, previous)| *health != AgentHealth::Offline
                    && *previous != AgentHealth::Offline),
            "No offline verdict may appear in this scenario."
        );
        assert_eq!(observed_transitions.len(), 2, "Exactly two transition events fire.");

        println!("   ✅ [SUCCESS]: Flap scenario certified.");
    }

    /**
     * CERTIFICACIÓN: Selección determinista de ociosos con guardia
     * de capacidades (el auto-registro arranca sin capacidades).
     */
    #[test]
    fn certify_idle_selection_capability_gate() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating idle selection discipline...");

        let registry = AgentRegistry::new(DEGRADED_AFTER_MS, OFFLINE_AFTER_MS);
        let epoch_ms = 2_000_000u64;

        // Auto-registrado por latido: capacidades vacías
        registry.update_status("crafter-2", AgentKind::Crafter, AgentStatus::Idle, None, epoch_ms);
        // Registrado por operador con capacidad reclamada
        registry.register(
            "crafter-9",
            AgentKind::Crafter,
            Some("Forge Beta".into()),
            BTreeSet::from(["craft".to_string()]),
            epoch_ms,
        );

        // La capacidad tipada excluye al auto-registrado
        let capable = registry.get_idle(Some("craft"), epoch_ms).expect("one capable agent");
        assert_eq!(capable.id, "crafter-9");

        // Sin requisito de capacidad: orden ascendente de id
        let any_idle = registry.get_idle(None, epoch_ms).expect("first by id");
        assert_eq!(any_idle.id, "crafter-2");

        // Un agente silencioso más allá del umbral offline no califica
        registry.register(
            "crafter-0",
            AgentKind::Crafter,
            None,
            BTreeSet::from(["craft".to_string()]),
            epoch_ms,
        );
        let late_clock = epoch_ms + OFFLINE_AFTER_MS + 1;
        registry.touch("crafter-9", AgentKind::Crafter, late_clock);
        let survivor = registry.get_idle(Some("craft"), late_clock).expect("healthy capable");
        assert_eq!(survivor.id, "crafter-9", "Offline agents are skipped by selection.");

        println!("   ✅ [SUCCESS]: Selection discipline certified.");
    }
}
