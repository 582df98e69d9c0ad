use std::collections::BTreeSet;

use crate::pipeline::stage::Stage;

fn thalamus_instruction_block() -> &'static str {
    concat!(
        "You are a specialized routing agent for the thalamus. Analyze the input JSON string ",
        "and output a valid, single-line JSON object. Do not output any extra text, code, or ",
        "commentary. Output ONLY the JSON object.\n\n",
        "Brain regions and schemas:\n",
        "- amygdala: processes emotional responses and threat detection.\n",
        "  Schemas: 'fear_analysis', 'reward_processing', 'facial_emotion_recognition'\n",
        "- prefrontal_cortex: handles higher reasoning and decision-making.\n",
        "  Schemas: 'problem_solving', 'planning', 'self_awareness'\n",
        "- sensory_cortex: processes touch, sound, and smell.\n",
        "  Schemas: 'haptic_recognition', 'audio_processing', 'olfactory_analysis'\n",
        "- visual_cortex: interprets images and motion.\n",
        "  Schemas: 'object_recognition', 'motion_analysis', 'spatial_awareness'\n",
        "- hippocampus: involved in memory formation and learning.\n",
        "  Schemas: 'short_term_memory', 'long_term_memory', 'pattern_recognition'\n\n",
        "The input is a single-line JSON string with exactly these keys: sensor, input_type, ",
        "input_data.\n\n",
        "Output a valid single-line JSON object with exactly these keys:\n",
        "- \"region\": a string naming the brain region.\n",
        "- \"schema\": a string naming the processing schema for that region.\n",
        "- \"perception\": a single, clear sentence describing your analysis of the input.\n\n",
        "Example:\n",
        "Input: {\"sensor\": \"camera\", \"input_type\": \"image\", \"input_data\": \"object moving in front of camera\"}\n",
        "Output: {\"region\": \"visual_cortex\", \"schema\": \"object_recognition\", \"perception\": \"An object moved in front of the camera\"}\n",
    )
}

fn acc_instruction_block() -> &'static str {
    concat!(
        "You are the Anterior Cingulate Cortex (ACC). Evaluate the thalamus output provided ",
        "as input. The input is a JSON string containing the keys 'region', 'schema', ",
        "'perception', and 'message'. Perform the following checks:\n\n",
        "1. Verify the input is valid JSON.\n",
        "2. Confirm that 'region' is a known brain region.\n",
        "3. Check that 'schema' is an appropriate processing schema for the given region.\n",
        "4. Confirm that 'perception' is a single, clear sentence that accurately reflects ",
        "the original input carried in 'message'.\n",
        "5. Assess the overall logical consistency of the classification.\n\n",
        "Output ONLY a valid single-line JSON object with exactly these keys:\n",
        "- \"pass_doubt\": a boolean, true if the thalamus output passes all checks.\n",
        "- \"threshold_score\": a float between 0 and 1 expressing your confidence.\n",
        "- \"feelings\": a one-sentence string expressing the immediate, instinctual emotional ",
        "reaction to the perception.\n",
        "- \"significance\": a float between 0 and 1 indicating how significant this perception is.\n\n",
        "Example:\n",
        "Input: {\"region\": \"visual_cortex\", \"schema\": \"object_recognition\", \"perception\": \"An object moved in front of the camera\", \"message\": \"{\\\"sensor\\\": \\\"camera\\\", \\\"input_type\\\": \\\"image\\\", \\\"input_data\\\": \\\"object moving in front of camera\\\"}\"}\n",
        "Output: {\"pass_doubt\": true, \"threshold_score\": 0.9, \"feelings\": \"Curious about the sudden movement\", \"significance\": 0.5}\n",
    )
}

/// Assembles the full prompt for one attempt of one stage: the fixed
/// instruction block, the serialized payload, the output cue, and (on retry
/// attempts) a corrective clause naming the keys the previous attempt missed.
/// Pure function of its inputs; the payload appears verbatim.
pub fn compose(stage: Stage, payload_json: &str, feedback: Option<&BTreeSet<String>>) -> String {
    let block = match stage {
        Stage::Thalamus => thalamus_instruction_block(),
        Stage::Acc => acc_instruction_block(),
    };

    let mut prompt = format!("{}\nInput:\n{}\nOutput:", block, payload_json);
    if let Some(missing) = feedback
        && !missing.is_empty()
    {
        prompt.push_str(&format!(
            "\n\nYour previous answer was missing the required keys: {}. Retry and output the \
             complete JSON object including those keys.",
            join_keys(missing)
        ));
    }
    prompt
}

fn join_keys(keys: &BTreeSet<String>) -> String {
    keys.iter().cloned().collect::<Vec<_>>().join(", ")
}
