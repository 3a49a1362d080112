//! Audio device enumeration and lookup
//!
//! Devices are enumerated across every available cpal host so a specific
//! backend (ALSA, PulseAudio, CoreAudio, ...) can be chosen in the config.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Human-readable name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn get_host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|&host_id| host_name(host_id) == name)
        .and_then(|host_id| cpal::host_from_id(host_id).ok())
}

/// Information about an audio output device
#[derive(Debug, Clone)]
pub struct OutputDevice {
    /// Device identifier for configuration (includes host info)
    pub id: DeviceId,
    /// Whether this is the default device of its host
    pub is_default: bool,
    /// Whether the device can run at the engine rate with f32 stereo output
    pub supports_engine_rate: bool,
    /// Maximum output channels
    pub max_channels: u16,
}

impl std::fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id.display_label())?;
        if self.is_default {
            write!(f, " (default)")?;
        }
        if !self.supports_engine_rate {
            write!(f, " [unsupported rate]")?;
        }
        Ok(())
    }
}

/// List output devices from all hosts, defaults first
pub fn get_output_devices(sample_rate: u32) -> AudioResult<Vec<OutputDevice>> {
    let mut all_devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };

        let host_label = host_name(host_id);
        let default_name = host
            .default_output_device()
            .and_then(|d: cpal::Device| d.name().ok());

        let devices = match host.output_devices() {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Could not enumerate devices for {:?}: {}", host_id, e);
                continue;
            }
        };

        for device in devices {
            let Ok(name) = device.name() else { continue };
            let Ok(configs) = device.supported_output_configs() else { continue };
            let configs: Vec<_> = configs.collect();
            if configs.is_empty() {
                continue;
            }

            let max_channels = configs.iter().map(|c| c.channels()).max().unwrap_or(0);
            let supports_engine_rate = configs.iter().any(|c| {
                c.sample_format() == cpal::SampleFormat::F32
                    && c.channels() >= 2
                    && (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&sample_rate)
            });

            all_devices.push(OutputDevice {
                is_default: default_name.as_ref() == Some(&name),
                id: DeviceId::with_host(&name, &host_label),
                supports_engine_rate,
                max_channels,
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoDevices);
    }

    all_devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.id.host.cmp(&b.id.host))
            .then_with(|| a.id.name.cmp(&b.id.name))
    });

    log::info!("Enumerated {} audio output devices", all_devices.len());
    Ok(all_devices)
}

/// Find a device by its ID
///
/// Uses the host named in the ID if present, otherwise searches every host.
pub fn find_device_by_id(id: &DeviceId) -> AudioResult<cpal::Device> {
    let matches = |d: &cpal::Device| d.name().ok().as_deref() == Some(id.name.as_str());

    if let Some(ref host_name) = id.host {
        let host = get_host_by_name(host_name)
            .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()))?;
        let mut devices = host
            .output_devices()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?;
        return devices
            .find(matches)
            .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()));
    }

    for host_id in cpal::available_hosts() {
        if let Ok(host) = cpal::host_from_id(host_id) {
            if let Ok(mut devices) = host.output_devices() {
                if let Some(device) = devices.find(matches) {
                    return Ok(device);
                }
            }
        }
    }

    Err(AudioError::DeviceNotFound(id.name.clone()))
}

/// Default output device of the default host
pub fn get_default_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice("No default output device".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_enumeration() {
        // May find nothing on headless CI machines
        match get_output_devices(44100) {
            Ok(devices) => {
                for device in &devices {
                    println!("  - {} ({} channels)", device, device.max_channels);
                }
            }
            Err(AudioError::NoDevices) => {
                println!("No audio devices available (expected in CI)");
            }
            Err(e) => {
                println!("Error enumerating devices: {}", e);
            }
        }
    }

    #[test]
    fn test_unknown_host_is_not_found() {
        let id = DeviceId::with_host("nothing", "NoSuchHost");
        assert!(matches!(find_device_by_id(&id), Err(AudioError::DeviceNotFound(_))));
    }
}
