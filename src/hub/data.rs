use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum IncidentType {
    Phishing,
    Malware,
    #[serde(rename = "Insider Threat")]
    InsiderThreat,
    #[serde(rename = "Mobile Device")]
    MobileDevice,
    #[serde(rename = "Data Breach")]
    DataBreach,
}

impl IncidentType {
    pub fn label(self) -> &'static str {
        match self {
            IncidentType::Phishing => "Phishing",
            IncidentType::Malware => "Malware",
            IncidentType::InsiderThreat => "Insider Threat",
            IncidentType::MobileDevice => "Mobile Device",
            IncidentType::DataBreach => "Data Breach",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStep {
    pub id: &'static str,
    pub title: &'static str,
    pub explanation: &'static str,
    pub scenario: &'static str,
    pub tools: &'static [&'static str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: &'static str,
    pub title: &'static str,
    pub incident_type: IncidentType,
    pub summary: &'static str,
    pub outcome: &'static str,
    pub details: &'static str,
    pub workflow: &'static [&'static str],
    pub tools: &'static [&'static str],
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ExampleImage {
    pub src: &'static str,
    pub alt: &'static str,
}

pub static EXAMPLE_IMAGES: [ExampleImage; 3] = [
    ExampleImage {
        src: "https://images.unsplash.com/photo-1506744038136-46273834b3fb?w=400&q=80",
        alt: "Misty mountain landscape",
    },
    ExampleImage {
        src: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&q=80",
        alt: "Portrait of a man",
    },
    ExampleImage {
        src: "https://images.unsplash.com/photo-1499951360447-b19be8fe80f5?w=400&q=80",
        alt: "Desktop scene with laptop",
    },
];

pub static TIMELINE_STEPS: [TimelineStep; 4] = [
    TimelineStep {
        id: "collection",
        title: "Evidence Collection",
        explanation: "The first step is to identify and collect potential digital evidence from sources like computers, mobile phones, and servers. This must be done in a way that is forensically sound, meaning the original data is not altered.",
        scenario: "An employee is suspected of leaking company data. A forensic examiner creates a bit-for-bit copy (forensic image) of the employee's hard drive and collects their company-issued mobile phone.",
        tools: &["FTK Imager", "EnCase Forensic Imager", "dd (Linux command)", "Write Blockers"],
    },
    TimelineStep {
        id: "preservation",
        title: "Preservation",
        explanation: "After collection, the evidence must be securely preserved to maintain its integrity. This involves creating a chain of custody document and verifying data integrity using hash values (like MD5 or SHA-256).",
        scenario: "The forensic image of the hard drive is verified by comparing its hash value to the original drive. The image is stored in a secure evidence locker, and all access is logged in the chain of custody form.",
        tools: &["HashCalc", "certutil (Windows command)", "sha256sum (Linux command)", "Chain of Custody Forms"],
    },
    TimelineStep {
        id: "analysis",
        title: "Analysis",
        explanation: "Examiners use specialized tools to analyze the collected data. This can involve recovering deleted files, searching for keywords, examining system logs, and identifying user activity.",
        scenario: "Using forensic software, the examiner analyzes the hard drive image. They discover fragments of deleted emails to a competitor, browser history showing visits to file-sharing websites, and USB device connection logs.",
        tools: &["Autopsy", "Magnet AXIOM", "Cellebrite UFED", "Wireshark", "Volatility"],
    },
    TimelineStep {
        id: "reporting",
        title: "Reporting",
        explanation: "The final step is to document the findings in a clear, concise, and technically accurate report. The report should detail the steps taken, the evidence found, and the conclusions drawn by the examiner.",
        scenario: "The examiner writes a comprehensive report detailing the evidence of data exfiltration. The report includes timestamps, copies of the recovered emails, and a timeline of the suspect's actions. This report is then presented to legal counsel.",
        tools: &["Microsoft Word / Excel", "Case Management Software", "FTK Report Generator"],
    },
];

pub static CASES: [Case; 4] = [
    Case {
        id: "case-1",
        title: "The Phishing Scheme at FinCorp",
        incident_type: IncidentType::Phishing,
        summary: "An investigation into a targeted phishing attack that led to unauthorized access to the company's financial systems.",
        outcome: "The entry point was identified as a malicious email attachment. The affected accounts were secured, and the attacker's C2 server was identified and reported.",
        details: "Employees reported receiving an urgent email from \"IT Support\" with a PDF attachment. Analysis of an employee's machine showed that opening the PDF executed a PowerShell script, which downloaded a Remote Access Trojan (RAT).",
        workflow: &["Email Header Analysis", "Malware Reverse Engineering", "Network Traffic Analysis", "Memory Forensics"],
        tools: &["Autopsy", "Wireshark", "Volatility", "Ghidra"],
    },
    Case {
        id: "case-2",
        title: "Insider Data Theft at TechSolutions",
        incident_type: IncidentType::InsiderThreat,
        summary: "A departing employee was suspected of stealing proprietary source code before leaving the company.",
        outcome: "Forensic analysis confirmed the employee copied large volumes of data to a personal USB drive in their final week. Legal action was initiated based on the forensic report.",
        details: "System logs showed a large number of file access events from the employee's account, concentrated on the main source code repository. Analysis of their work computer revealed connection logs for an unauthorized USB device and remnants of deleted files that matched the repository contents.",
        workflow: &["Live System Analysis", "File System Forensics", "Windows Registry Analysis", "Log Correlation"],
        tools: &["FTK Imager", "Magnet AXIOM", "RegRipper"],
    },
    Case {
        id: "case-3",
        title: "Mobile Device Compromise",
        incident_type: IncidentType::MobileDevice,
        summary: "A corporate executive's smartphone was examined after they reported unusual behavior and battery drain.",
        outcome: "A sophisticated piece of spyware was found on the device, exfiltrating call logs, text messages, and GPS data. The spyware was removed and the source was traced to a malicious app installed from a third-party store.",
        details: "A full file system extraction of the mobile device was performed. The analysis focused on installed applications, running processes, and network connections. A hidden application was discovered that was communicating with a known malicious domain.",
        workflow: &["Mobile Device Acquisition", "File System Analysis", "Malware Analysis (Mobile)", "Network Forensics"],
        tools: &["Cellebrite UFED", "Autopsy", "MobSF", "Wireshark"],
    },
    Case {
        id: "case-4",
        title: "Ransomware Attack on a Healthcare Provider",
        incident_type: IncidentType::Malware,
        summary: "Investigating a ransomware attack that encrypted patient records and demanded a ransom in cryptocurrency.",
        outcome: "The initial infection vector was an exposed RDP port. The specific ransomware variant was identified, and while the data could not be decrypted without backups, the attacker's TTPs were documented to prevent re-infection.",
        details: "The ransomware left a note on the server desktops. Forensic analysis of server images identified the encryption process and the lateral movement techniques used by the attacker. Network logs helped pinpoint the initial brute-force attack against the RDP server.",
        workflow: &["Live Memory Acquisition", "Network Traffic Analysis", "Malware Analysis", "Log Analysis"],
        tools: &["Volatility", "Wireshark", "Autopsy", "Splunk"],
    },
];

pub fn timeline_index(step_id: &str) -> Option<usize> {
    TIMELINE_STEPS.iter().position(|step| step.id == step_id)
}

pub fn find_case(case_id: &str) -> Option<&'static Case> {
    CASES.iter().find(|case| case.id == case_id)
}
