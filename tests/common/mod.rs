// Shared test helpers: a mock rig speaking the sgminer-style API on localhost.

#![allow(dead_code)]

use rigpoller::config::RigConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct MockRig {
    pub config: RigConfig,
    connections: Arc<AtomicUsize>,
    responses: Arc<Mutex<HashMap<String, String>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockRig {
    /// Number of connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Replace the whole reply table; later connections see the new replies.
    pub fn set_responses(&self, responses: HashMap<String, String>) {
        *self.responses.lock().unwrap() = responses;
    }
}

impl Drop for MockRig {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `responses` (command → reply). Unknown commands get an empty reply.
pub async fn spawn_rig(name: &str, responses: HashMap<String, String>) -> MockRig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let responses = Arc::new(Mutex::new(responses));
    let table = responses.clone();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let table = table.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 256];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let command = String::from_utf8_lossy(&buf[..n]).to_string();
                let reply = table.lock().unwrap().get(&command).cloned();
                if let Some(reply) = reply {
                    let _ = stream.write_all(reply.as_bytes()).await;
                }
                let _ = stream.shutdown().await;
            });
        }
    });

    MockRig {
        config: RigConfig {
            address: "127.0.0.1".into(),
            port,
            display_name: name.into(),
        },
        connections,
        responses,
        handle,
    }
}

/// A rig config pointing at a port nothing listens on (connection refused).
pub async fn unreachable_rig(name: &str) -> RigConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    RigConfig {
        address: "127.0.0.1".into(),
        port,
        display_name: name.into(),
    }
}

pub fn gpucount_response(n: u32) -> String {
    format!(
        "STATUS=S,When=1543563443,Code=20,Msg=GPU count,Description=sgminer 5.6.0|GPUS={}|\0",
        n
    )
}

/// `gpu|i` reply in the `KHS 5s` variant.
pub fn gpu_response(index: u32, khs_av: f64) -> String {
    format!(
        "STATUS=S,When=1543563443,Code=17,Msg=GPU{i},Description=sgminer 5.6.0|GPU={i},Enabled=Y,Status=Alive,Temperature=63.00,Fan Speed=2100,Fan Percent=45,GPU Clock=1150,Memory Clock=2000,GPU Voltage=0.950,GPU Activity=100,Powertune=0,KHS av={khs},KHS 5s={khs},Accepted=120,Rejected=3,Hardware Errors=1,Utility=1.20,Intensity=0|\0",
        i = index,
        khs = khs_av
    )
}

/// `gpu|i` reply in the `KHS 30s` variant.
pub fn gpu_response_30s(index: u32, khs_av: f64) -> String {
    format!(
        "STATUS=S,When=1543563443,Code=17,Msg=GPU{i},Description=TeamRedMiner 0.3.8|GPU={i},Enabled=Y,Status=Alive,Temperature=70.00,Fan Speed=3000,Fan Percent=80,GPU Clock=1200,Memory Clock=2000,GPU Activity=98,KHS av={khs},KHS 30s={khs},Accepted=40,Rejected=0,Hardware Errors=0,Utility=0.80|\0",
        i = index,
        khs = khs_av
    )
}

pub fn version_response(miner: &str) -> String {
    format!(
        "STATUS=S,When=1543563443,Code=22,Msg=versions,Description={m}|VERSION,Miner={m},API=3.7|\0",
        m = miner
    )
}

pub fn coin_response(description: &str, algorithm: &str) -> String {
    format!(
        "STATUS=S,When=1543563443,Code=78,Msg=coin,Description={}|COIN,Hash Method={},Current Block Time=1543563400.1,Current Block Hash=abc,LP=true,Network Difficulty=1.0|\0",
        description, algorithm
    )
}

/// A healthy sgminer rig whose GPUs report the given KH/s.
pub fn healthy_responses(gpu_khs: &[f64]) -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("gpucount".to_string(), gpucount_response(gpu_khs.len() as u32));
    for (i, khs) in gpu_khs.iter().enumerate() {
        m.insert(format!("gpu|{}", i), gpu_response(i as u32, *khs));
    }
    m.insert("version".to_string(), version_response("sgminer 5.6.0"));
    m.insert("coin".to_string(), coin_response("sgminer 5.6.0", "cryptonight"));
    m
}
