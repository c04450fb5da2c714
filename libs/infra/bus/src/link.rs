// [libs/infra/bus/src/link.rs]
/*!
 * =================================================================
 * APARATO: PHYSICAL BUS LINKS (V18.2 - FABRIC GOLD)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ENLACES FÍSICOS INTERCAMBIABLES DEL BUS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. UDP BROADCAST: Despliegue real — difusión en el segmento local,
 *    entrega at-least-once sin orden garantizado.
 * 2. LOOPBACK PAIR: Proving Grounds — par de canales en RAM con la
 *    misma semántica de trama, determinista y sin red.
 * =================================================================
 */

use crate::errors::BusFault;
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Tamaño máximo nominal de una trama del bus.
const MAXIMUM_FRAME_OCTETS: usize = 65_507;

/// Contrato del enlace físico: tramas opacas, sin garantías de orden.
#[async_trait]
pub trait BusLink: Send + Sync {
    /// Difunde una trama en el canal compartido.
    async fn transmit(&self, frame: &[u8]) -> Result<(), BusFault>;

    /// Bloquea hasta recibir la siguiente trama entrante.
    async fn receive_frame(&self) -> Result<Vec<u8>, BusFault>;
}

// --- ENLACE DE DESPLIEGUE: UDP BROADCAST ---

/// Enlace UDP de difusión en el segmento local.
pub struct UdpBroadcastLink {
    socket: UdpSocket,
    broadcast_endpoint: SocketAddrV4,
}

impl UdpBroadcastLink {
    /**
     * Ancla el socket en el puerto de canal y habilita broadcast.
     *
     * # Errors:
     * Retorna `LinkIo` si el puerto está tomado o el kernel niega
     * el modo de difusión.
     */
    pub async fn bind(channel_port: u16) -> Result<Self, BusFault> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, channel_port)).await?;
        socket.set_broadcast(true)?;

        Ok(Self {
            socket,
            broadcast_endpoint: SocketAddrV4::new(Ipv4Addr::BROADCAST, channel_port),
        })
    }
}

#[async_trait]
impl BusLink for UdpBroadcastLink {
    async fn transmit(&self, frame: &[u8]) -> Result<(), BusFault> {
        self.socket.send_to(frame, self.broadcast_endpoint).await?;
        Ok(())
    }

    async fn receive_frame(&self) -> Result<Vec<u8>, BusFault> {
        let mut frame_buffer = vec![0u8; MAXIMUM_FRAME_OCTETS];
        let (octet_count, remote_endpoint) = self.socket.recv_from(&mut frame_buffer).await?;
        frame_buffer.truncate(octet_count);
        debug!("📡 [LINK_RX]: {} octets from {}.", octet_count, remote_endpoint);
        Ok(frame_buffer)
    }
}

// --- ENLACE DE PROVING GROUNDS: LOOPBACK EN RAM ---

/// Extremo de un par loopback: lo que un lado transmite, el otro recibe.
pub struct LoopbackLink {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl LoopbackLink {
    /// Forja un par de extremos cruzados (controlador <-> agente).
    pub fn pair() -> (Self, Self) {
        let (left_sender, left_receiver) = mpsc::unbounded_channel();
        let (right_sender, right_receiver) = mpsc::unbounded_channel();

        (
            Self {
                outbound: left_sender,
                inbound: Mutex::new(right_receiver),
            },
            Self {
                outbound: right_sender,
                inbound: Mutex::new(left_receiver),
            },
        )
    }
}

#[async_trait]
impl BusLink for LoopbackLink {
    async fn transmit(&self, frame: &[u8]) -> Result<(), BusFault> {
        self.outbound
            .send(frame.to_vec())
            .map_err(|_| BusFault::LinkClosed)
    }

    async fn receive_frame(&self) -> Result<Vec<u8>, BusFault> {
        let mut inbound_guard = self.inbound.lock().await;
        inbound_guard.recv().await.ok_or(BusFault::LinkClosed)
    }
}
