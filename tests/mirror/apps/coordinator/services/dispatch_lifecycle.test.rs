// [tests/mirror/apps/coordinator/services/dispatch_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CICLO DE DESPACHO (V7.4 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: ASIGNACIÓN A OCIOSOS, SOBRES DE TRABAJO Y MANDOS
 * =================================================================
 */

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use telar_coordinator::config::CoordinatorConfig;
use telar_coordinator::errors::AgentFault;
use telar_coordinator::services::{execute_dispatch_pass, issue_command};
use telar_coordinator::state::AppState;
use telar_domain_models::{
    AgentKind, AgentStatus, CommandVerb, ItemKey, MessagePayload, Recipe, RecipeBook, RecipeInput,
};
use telar_infra_bus::{BusLink, LoopbackLink, MessageBus};
use telar_infra_driver::{FabricDriver, SimulatedFabric};

fn table_recipes() -> RecipeBook {
    RecipeBook::new(
        vec![Recipe {
            output: ItemKey::bare("minecraft:crafting_table"),
            output_count: 1,
            inputs: vec![RecipeInput {
                item: ItemKey::bare("minecraft:planks"),
                count: 4,
            }],
        }],
        Vec::new(),
        Vec::new(),
    )
}

fn forge_state() -> (AppState, MessageBus, tempfile::TempDir) {
    let vault_root = tempfile::tempdir().expect("ephemeral vault");
    let config = CoordinatorConfig::for_testing(vault_root.path().to_path_buf());

    let fabric = Arc::new(SimulatedFabric::new());
    let (coordinator_side, agent_side) = LoopbackLink::pair();
    let (state, _transactions) = AppState::new(
        Arc::new(config),
        fabric as Arc<dyn FabricDriver>,
        Arc::new(coordinator_side) as Arc<dyn BusLink>,
        table_recipes(),
    )
    .expect("state ignition");

    let agent_bus = MessageBus::new("crafter-1", None, Arc::new(agent_side) as Arc<dyn BusLink>);
    (state, agent_bus, vault_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: El despachador sella propiedad y emite el
     * CRAFT_REQUEST al agente capaz.
     */
    #[tokio::test]
    async fn certify_dispatch_to_capable_idle_agent() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating dispatch handshake...");

        let (state, agent_bus, _vault) = forge_state();
        let now_ms = state.now_ms();

        // Un job pendiente con reserva satisfecha
        let rich_stock = HashMap::from([(ItemKey::bare("minecraft:planks"), 100u64)]);
        let job = {
            let mut queue_guard = state.queue.lock().expect("queue");
            queue_guard
                .add(
                    ItemKey::bare("minecraft:crafting_table"),
                    2,
                    &rich_stock,
                    &state.recipes,
                    now_ms,
                )
                .expect("reservation")
        };

        // Agente capaz registrado por el operador
        state.registry.register(
            "crafter-1",
            AgentKind::Crafter,
            Some("Forge Alpha".into()),
            BTreeSet::from(["craft".to_string()]),
            now_ms,
        );

        let dispatched = execute_dispatch_pass(&state).await.expect("pass");
        assert_eq!(dispatched, 1);

        // Sello de propiedad en cola y radar
        {
            let queue_guard = state.queue.lock().expect("queue");
            assert_eq!(queue_guard.pending_count(), 0);
            assert_eq!(queue_guard.active_count(), 1);
        }
        let record = state.registry.get("crafter-1").expect("registered");
        assert_eq!(record.status, AgentStatus::Busy);
        assert_eq!(record.current_job, Some(job.id));

        // El sobre de trabajo llegó al agente
        let work_order = agent_bus
            .receive(Some(Duration::from_secs(1)))
            .await
            .expect("link alive")
            .expect("envelope within bound");
        match work_order.payload {
            MessagePayload::CraftRequest { job: wired_job } => {
                assert_eq!(wired_job.id, job.id);
                assert_eq!(wired_job.qty, 2);
            }
            other => panic!("INTEGRITY_COLLAPSE: Expected CRAFT_REQUEST, got {}", other.kind()),
        }

        // Sin más ociosos capaces: un segundo pase no despacha
        let second_pass = execute_dispatch_pass(&state).await.expect("pass");
        assert_eq!(second_pass, 0);

        println!("   ✅ [SUCCESS]: Dispatch handshake certified.");
    }

    /**
     * CERTIFICACIÓN: Guardias de mando de flota — AgentNotFound para
     * ids fantasma; el rastreador resuelve ACKs correlacionados.
     */
    #[tokio::test]
    async fn certify_fleet_command_guards() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating fleet command guards...");

        let (state, _agent_bus, _vault) = forge_state();

        // Mando hacia un agente jamás visto
        let verdict = issue_command(
            &state,
            "ghost-42",
            CommandVerb::GoHome,
            serde_json::Value::Null,
        )
        .await;
        assert_eq!(
            verdict,
            Err(AgentFault::AgentNotFound { agent: "ghost-42".into() })
        );

        // Correlación del rastreador: ACK resuelve el canal registrado
        let resolution = state.commands.register("cmd-123");
        state.commands.resolve_ack("cmd-123");
        let outcome = resolution.await.expect("channel resolved");
        assert!(outcome.is_ok());

        println!("   ✅ [SUCCESS]: Command guards certified.");
    }
}
