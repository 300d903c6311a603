#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::sync::{Arc, Mutex};

    use ndarray::{Array1, ArrayView1};

    use crate::analysis::{Analysis, DetrendStrategy, HeartRate, Parameters};
    use crate::error::AnalysisError;
    use crate::log::silent_logger;
    use crate::mock::PulseTrain;

    fn analysis(params: Parameters) -> Analysis {
        Analysis::with_logger(params, silent_logger())
    }

    fn pulse_signal(train: &PulseTrain) -> Array1<f64> {
        Array1::from_vec(train.generate())
    }

    #[test]
    fn recovers_rate_of_clean_pulse_train() {
        let train = PulseTrain::default();
        let detection = analysis(Parameters::default())
            .analyze(pulse_signal(&train).view())
            .unwrap();

        assert_eq!(detection.peaks, train.beat_positions());
        assert!((detection.bpm - 75.0).abs() < 1e-6, "bpm {}", detection.bpm);
        assert_eq!(detection.cleaned.len(), 2500);
        assert_eq!(detection.time_axis.len(), 2500);
        assert_eq!(detection.time_axis[250], 1.0);
    }

    #[test]
    fn recovers_rate_through_drift_and_noise() {
        let train = PulseTrain {
            bpm: 60.0,
            seconds: 20.0,
            offset: 512.0,
            drift: 3.0,
            noise: 0.05,
            seed: 42,
            ..PulseTrain::default()
        };
        let result = analysis(Parameters::default()).run_signal(pulse_signal(&train).view());

        assert!((result.bpm - 60.0).abs() < 1.0, "bpm {}", result.bpm);
        assert!(result.signal.iter().sum::<f64>().abs() < 1e-6);
    }

    #[test]
    fn bpm_matches_mean_rr_interval() {
        let train = PulseTrain {
            bpm: 92.0,
            noise: 0.02,
            seed: 3,
            ..PulseTrain::default()
        };
        let detection = analysis(Parameters::default())
            .analyze(pulse_signal(&train).view())
            .unwrap();

        assert!(detection.peaks.len() >= 2);
        let mean_rr = detection.rr_intervals.iter().sum::<f64>() / detection.rr_intervals.len() as f64;
        assert!((detection.bpm - 60.0 / mean_rr).abs() < 1e-9);
    }

    #[test]
    fn peaks_keep_minimum_spacing() {
        let train = PulseTrain {
            bpm: 140.0,
            noise: 0.1,
            seed: 11,
            ..PulseTrain::default()
        };
        let params = Parameters::default();
        let distance = params.min_peak_distance();
        let detection = analysis(params).analyze(pulse_signal(&train).view()).unwrap();

        assert_eq!(distance, 100);
        assert!(detection
            .peaks
            .windows(2)
            .all(|w| w[1] > w[0] && w[1] - w[0] >= distance));
    }

    #[test]
    fn rates_above_the_distance_ceiling_are_folded() {
        // 200 BPM beats are 75 samples apart, closer than the 100-sample refractory distance
        let train = PulseTrain {
            bpm: 200.0,
            ..PulseTrain::default()
        };
        let signal = pulse_signal(&train);

        let capped = analysis(Parameters::default()).analyze(signal.view()).unwrap();
        assert!(capped.bpm < 150.0, "bpm {}", capped.bpm);

        let relaxed = analysis(Parameters {
            min_distance_divisor: 5.0,
            ..Parameters::default()
        })
        .analyze(signal.view())
        .unwrap();
        assert!((relaxed.bpm - 200.0).abs() < 1.0, "bpm {}", relaxed.bpm);
    }

    #[test]
    fn short_signal_is_insufficient() {
        let signal = Array1::from_vec(PulseTrain::default().generate()[..249].to_vec());
        let analysis = analysis(Parameters::default());

        assert!(matches!(
            analysis.analyze(signal.view()),
            Err(AnalysisError::InsufficientData {
                len: 249,
                required: 250
            })
        ));
        assert_eq!(analysis.run_signal(signal.view()), HeartRate::empty());
    }

    #[test]
    fn exactly_one_second_is_accepted() {
        let signal = Array1::from_vec(PulseTrain::default().generate()[..250].to_vec());
        let result = analysis(Parameters::default()).run_signal(signal.view());

        assert_eq!(result.signal.len(), 250);
        assert_eq!(result.time_axis.len(), 250);
        // a single beat in one second
        assert_eq!(result.bpm, 0.0);
    }

    #[test]
    fn constant_signal_has_zero_bpm() {
        let signal = Array1::from_elem(1000, 3.3);
        let detection = analysis(Parameters::default())
            .analyze(signal.view())
            .unwrap();

        assert!(detection.peaks.is_empty());
        assert_eq!(detection.bpm, 0.0);
        assert_eq!(detection.cleaned.len(), 1000);
    }

    #[test]
    fn constant_detrend_leaves_drift_in_place() {
        let signal = Array1::from_iter((0..500).map(|i| i as f64));
        let detection = analysis(Parameters {
            detrend: DetrendStrategy::Constant,
            ..Parameters::default()
        })
        .analyze(signal.view())
        .unwrap();

        assert_eq!(detection.cleaned[0], -249.5);
        assert!(detection.peaks.is_empty());
    }

    #[test]
    fn bandpass_stage_is_optional() {
        let train = PulseTrain {
            drift: 5.0,
            noise: 0.05,
            seed: 5,
            ..PulseTrain::default()
        };
        let signal = pulse_signal(&train);
        let plain = analysis(Parameters::default()).analyze(signal.view()).unwrap();
        let filtered = analysis(Parameters {
            bandpass: Some((0.5, 40.0)),
            ..Parameters::default()
        })
        .analyze(signal.view())
        .unwrap();

        assert_ne!(plain.cleaned, filtered.cleaned);
        assert!((filtered.bpm - 75.0).abs() < 1.0, "bpm {}", filtered.bpm);
    }

    #[test]
    fn invalid_parameters_degrade_to_empty() {
        let signal = pulse_signal(&PulseTrain::default());
        let cases = [
            Parameters {
                sampling_frequency: 0,
                ..Parameters::default()
            },
            Parameters {
                threshold_k: f64::NAN,
                ..Parameters::default()
            },
            Parameters {
                min_distance_divisor: 0.0,
                ..Parameters::default()
            },
            Parameters {
                bandpass: Some((40.0, 0.5)),
                ..Parameters::default()
            },
        ];

        for params in cases {
            let analysis = analysis(params);
            assert!(matches!(
                analysis.analyze(signal.view()),
                Err(AnalysisError::InvalidParameter(_))
            ));
            assert_eq!(analysis.run_signal(signal.view()), HeartRate::empty());
        }
    }

    #[test]
    fn min_peak_distance_rounds_and_never_reaches_zero() {
        assert_eq!(Parameters::with_sampling_frequency(250).min_peak_distance(), 100);
        assert_eq!(Parameters::with_sampling_frequency(128).min_peak_distance(), 51);
        assert_eq!(Parameters::with_sampling_frequency(1).min_peak_distance(), 1);
    }

    #[test]
    fn plotter_sees_every_stage() {
        let titles = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&titles);

        let mut analysis = analysis(Parameters::default());
        analysis.plotter = Some(Box::new(
            move |signal: ArrayView1<f64>,
                  title: &str,
                  points: Option<&[usize]>|
                  -> Result<(), Box<dyn Error>> {
                recorded
                    .lock()
                    .unwrap()
                    .push((title.to_string(), signal.len(), points.map(|p| p.len())));
                Ok(())
            },
        ));
        analysis.run_signal(pulse_signal(&PulseTrain::default()).view());

        let titles = titles.lock().unwrap();
        let names: Vec<&str> = titles.iter().map(|(t, _, _)| t.as_str()).collect();
        assert_eq!(names, vec!["Raw Signal", "Detrended Signal", "Peaks"]);
        assert_eq!(titles[2], ("Peaks".to_string(), 2500, Some(12)));
    }

    #[test]
    fn plotter_failure_is_not_fatal() {
        let mut analysis = analysis(Parameters::default());
        analysis.plotter = Some(Box::new(
            |_: ArrayView1<f64>, _: &str, _: Option<&[usize]>| -> Result<(), Box<dyn Error>> {
                Err("no backend".into())
            },
        ));

        let result = analysis.run_signal(pulse_signal(&PulseTrain::default()).view());
        assert!((result.bpm - 75.0).abs() < 1e-6);
    }

    #[test]
    fn preview_is_clamped_to_signal_length() {
        let result = analysis(Parameters::default()).run_signal(pulse_signal(&PulseTrain::default()).view());

        let (t, s) = result.preview(1000);
        assert_eq!((t.len(), s.len()), (1000, 1000));
        let (t, s) = result.preview(10_000);
        assert_eq!((t.len(), s.len()), (2500, 2500));
        let hr = HeartRate::empty();
        let (t, s) = hr.preview(1000);
        assert!(t.is_empty() && s.is_empty());
    }
}
